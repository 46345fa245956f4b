use crate::capture::artifact::{Artifact, ArtifactSaver};
use crate::capture::config::CaptureConfig;
use crate::encode::encoder::{
    ChunkSender, EncoderBackend, EncoderEvent, EncoderEventKind, EncoderHandle, SessionId,
};
use crate::foundation::error::{CaptureError, CaptureResult};
use crate::render::surface::Surface;
use std::sync::mpsc::{self, Receiver};

/// Lifecycle state of the capture controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CaptureState {
    /// No session has been started (or the last start failed).
    #[default]
    Idle,
    /// An encoder is bound to a surface stream.
    Recording,
    /// The last session was finalized; its chunks are kept until the next start.
    Stopped,
}

struct ActiveEncoder {
    handle: Box<dyn EncoderHandle>,
    events: Receiver<EncoderEvent>,
}

/// Owns the recording lifecycle: binds a surface stream to an encoder, buffers the encoded
/// chunks, and packages them into an [`Artifact`] on download.
///
/// Encoder workers never touch the chunk buffer. They send [`EncoderEvent`]s, and the controller
/// appends them in [`CaptureController::pump`], which is the single mutation point.
pub struct CaptureController {
    cfg: CaptureConfig,
    backend: Box<dyn EncoderBackend>,
    saver: Box<dyn ArtifactSaver>,

    state: CaptureState,
    session: SessionId,
    chunks: Vec<Vec<u8>>,
    container: String,
    active: Option<ActiveEncoder>,
}

impl CaptureController {
    /// Create an idle controller.
    pub fn new(
        cfg: CaptureConfig,
        backend: Box<dyn EncoderBackend>,
        saver: Box<dyn ArtifactSaver>,
    ) -> CaptureResult<Self> {
        cfg.validate()?;
        let container = cfg.mime_type.clone();
        Ok(Self {
            cfg,
            backend,
            saver,
            state: CaptureState::Idle,
            session: SessionId::default(),
            chunks: Vec::new(),
            container,
            active: None,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// `true` iff a session is recording.
    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    /// Identifier of the most recent session.
    pub fn session_id(&self) -> SessionId {
        self.session
    }

    /// Chunks collected for the current session, in arrival order.
    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    /// Total bytes collected for the current session.
    pub fn captured_bytes(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Capture settings.
    pub fn config(&self) -> &CaptureConfig {
        &self.cfg
    }

    /// Start a new session capturing `surface`.
    ///
    /// A session that is still recording is stopped and discarded first. On failure the
    /// controller is left `Idle`, except for an invalid surface, which leaves the state as it was.
    #[tracing::instrument(skip_all, fields(backend = self.backend.name()))]
    pub fn start_recording(&mut self, surface: &mut dyn Surface) -> CaptureResult<()> {
        let canvas = surface.canvas();
        if !surface.is_capturable() {
            return Err(CaptureError::invalid_surface(
                "surface cannot emit a capture stream",
            ));
        }
        canvas
            .validate_for_video()
            .map_err(|e| CaptureError::invalid_surface(e.to_string()))?;

        if let Some(prev) = self.active.take() {
            tracing::info!(session = self.session.0, "discarding running session");
            // Dropping the receiver first means nothing the old encoder flushes can land here.
            drop(prev.events);
            if let Err(e) = prev.handle.finish() {
                tracing::warn!(error = %e, "previous encoder did not finish cleanly");
            }
        }

        self.chunks.clear();
        self.session = SessionId(self.session.0 + 1);
        self.state = CaptureState::Idle;

        let stream = surface
            .capture_stream(self.cfg.fps)
            .map_err(|e| CaptureError::recording_start(format!("stream acquisition failed: {e}")))?;

        let (tx, rx) = mpsc::channel();
        let out = ChunkSender::new(self.session, tx);
        let handle = self
            .backend
            .open(stream, &self.cfg.encoder_opts(), out)
            .map_err(|e| CaptureError::recording_start(format!("encoder open failed: {e}")))?;

        self.container = handle.mime_type().to_string();
        self.active = Some(ActiveEncoder { handle, events: rx });
        self.state = CaptureState::Recording;
        tracing::info!(
            session = self.session.0,
            width = canvas.width,
            height = canvas.height,
            "recording started"
        );
        Ok(())
    }

    /// Finalize the running session. No-op unless recording.
    ///
    /// Returns after every chunk the encoder flushed has been appended. An encoder that fails to
    /// finalize is logged; the session still ends `Stopped` with the chunks captured so far.
    #[tracing::instrument(skip_all, fields(session = self.session.0))]
    pub fn stop_recording(&mut self) {
        if self.state != CaptureState::Recording {
            return;
        }

        if let Some(active) = self.active.take() {
            if let Err(e) = active.handle.finish() {
                tracing::warn!(error = %e, "encoder finalize failed");
            }
            // Workers are joined at this point, so the channel holds the complete tail.
            for ev in active.events.try_iter() {
                self.apply(ev);
            }
        }

        self.state = CaptureState::Stopped;
        tracing::info!(
            chunks = self.chunks.len(),
            bytes = self.captured_bytes(),
            "recording stopped"
        );
    }

    /// Package the collected chunks and hand them to the saver.
    ///
    /// Returns `Ok(None)` without saving when nothing was captured. On failure the chunks are
    /// kept so the call can be retried.
    #[tracing::instrument(skip_all, fields(session = self.session.0))]
    pub fn download_video(&mut self) -> CaptureResult<Option<Artifact>> {
        self.pump();
        if self.chunks.is_empty() {
            tracing::debug!("nothing captured, download skipped");
            return Ok(None);
        }

        let artifact = Artifact::assemble(
            self.chunks.iter().map(Vec::as_slice),
            self.cfg.file_name.as_str(),
            self.container.as_str(),
        )?;
        self.saver.save(&artifact).map_err(|e| match e {
            CaptureError::Export(_) => e,
            other => CaptureError::export(other.to_string()),
        })?;
        Ok(Some(artifact))
    }

    /// Append every encoder event delivered so far. Returns the number of chunks appended.
    pub fn pump(&mut self) -> usize {
        let Some(active) = self.active.as_ref() else {
            return 0;
        };
        let events: Vec<EncoderEvent> = active.events.try_iter().collect();
        let before = self.chunks.len();
        for ev in events {
            self.apply(ev);
        }
        self.chunks.len() - before
    }

    fn apply(&mut self, ev: EncoderEvent) {
        if ev.session != self.session {
            tracing::trace!(stale = ev.session.0, "event from a replaced session ignored");
            return;
        }
        match ev.kind {
            EncoderEventKind::Data(data) if data.is_empty() => {}
            EncoderEventKind::Data(data) => self.chunks.push(data),
            EncoderEventKind::Error(msg) => {
                tracing::warn!(session = ev.session.0, error = %msg, "encoder reported an error");
            }
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            drop(active.events);
            if let Err(e) = active.handle.finish() {
                tracing::warn!(error = %e, "encoder finalize failed while dropping the controller");
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/controller.rs"]
mod tests;
