use crate::foundation::error::{CaptureError, CaptureResult};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// The packaged output of a capture session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    file_name: String,
    mime_type: String,
    data: Arc<[u8]>,
}

impl Artifact {
    /// Concatenate `chunks` in order into one artifact.
    pub fn assemble<'a>(
        chunks: impl IntoIterator<Item = &'a [u8]>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> CaptureResult<Self> {
        let file_name = file_name.into();
        if file_name.is_empty() {
            return Err(CaptureError::export("artifact file name is empty"));
        }

        let mut data = Vec::new();
        for chunk in chunks {
            data.try_reserve(chunk.len()).map_err(|e| {
                CaptureError::export(format!("failed to allocate artifact buffer: {e}"))
            })?;
            data.extend_from_slice(chunk);
        }

        Ok(Self {
            file_name,
            mime_type: mime_type.into(),
            data: data.into(),
        })
    }

    /// Output file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Container MIME type.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Artifact bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Return `true` when the artifact holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The "trigger a save" primitive the controller hands finished artifacts to.
pub trait ArtifactSaver: Send {
    /// Persist or hand off `artifact`.
    fn save(&mut self, artifact: &Artifact) -> CaptureResult<()>;
}

/// Saver that writes artifacts into a directory.
#[derive(Clone, Debug)]
pub struct FileSaver {
    dir: PathBuf,
    overwrite: bool,
}

impl FileSaver {
    /// Save into `dir`, replacing existing files.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overwrite: true,
        }
    }

    /// Refuse to replace an existing file when `overwrite` is false.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Target path for `artifact`.
    pub fn path_for(&self, artifact: &Artifact) -> PathBuf {
        self.dir.join(artifact.file_name())
    }
}

impl ArtifactSaver for FileSaver {
    fn save(&mut self, artifact: &Artifact) -> CaptureResult<()> {
        let path = self.path_for(artifact);
        ensure_parent_dir(&path)?;
        if !self.overwrite && path.exists() {
            return Err(CaptureError::export(format!(
                "output file '{}' already exists",
                path.display()
            )));
        }

        // Written to a sibling file, then renamed into place.
        let tmp = path.with_extension("partial");
        std::fs::write(&tmp, artifact.data())
            .map_err(|e| CaptureError::export(format!("failed to write '{}': {e}", tmp.display())))?;
        std::fs::rename(&tmp, &path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            CaptureError::export(format!("failed to move artifact to '{}': {e}", path.display()))
        })?;

        tracing::info!(path = %path.display(), bytes = artifact.len(), "artifact saved");
        Ok(())
    }
}

/// Saver that keeps artifacts in memory, for tests and embedding.
///
/// Clones share the same storage, so a caller can keep one clone and hand another to the
/// controller.
#[derive(Clone, Debug, Default)]
pub struct InMemorySaver {
    saved: Arc<Mutex<Vec<Artifact>>>,
}

impl InMemorySaver {
    /// Create an empty saver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every artifact saved so far, oldest first.
    pub fn saved(&self) -> Vec<Artifact> {
        self.saved
            .lock()
            .map(|v| v.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl ArtifactSaver for InMemorySaver {
    fn save(&mut self, artifact: &Artifact) -> CaptureResult<()> {
        self.saved
            .lock()
            .map_err(|_| CaptureError::export("in-memory saver lock poisoned"))?
            .push(artifact.clone());
        Ok(())
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> CaptureResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/capture/artifact.rs"]
mod tests;
