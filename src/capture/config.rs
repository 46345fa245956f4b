use crate::encode::encoder::{EncoderOpts, VideoCodec};
use crate::foundation::core::Fps;
use crate::foundation::error::{CaptureError, CaptureResult};
use std::path::Path;
use std::time::Duration;

/// Fixed capture settings.
///
/// There is exactly one export format; the defaults are the shipped configuration and a JSON file
/// may override individual fields.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Stream capture rate.
    pub fps: Fps,
    /// Video codec.
    pub codec: VideoCodec,
    /// Target video bitrate in bits per second.
    pub bitrate_bps: u64,
    /// How often the encoder hands buffered output over, in milliseconds.
    pub timeslice_ms: u64,
    /// Artifact filename.
    pub file_name: String,
    /// Artifact container MIME type.
    pub mime_type: String,
    /// Frames a capture stream may queue before dropping.
    pub stream_capacity: usize,
    /// Background used to flatten alpha before encoding (straight RGBA8).
    pub bg_rgba: [u8; 4],
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fps: Fps { num: 30, den: 1 },
            codec: VideoCodec::Vp8,
            bitrate_bps: 2_500_000,
            timeslice_ms: 100,
            file_name: "animation.webm".to_string(),
            mime_type: "video/webm".to_string(),
            stream_capacity: 8,
            bg_rgba: [0, 8, 20, 255],
        }
    }
}

impl CaptureConfig {
    /// Load overrides from a JSON file; missing fields keep their defaults.
    pub fn from_json_path(path: impl AsRef<Path>) -> CaptureResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CaptureError::config(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Parse overrides from JSON text.
    pub fn from_json_str(text: &str) -> CaptureResult<Self> {
        let cfg: Self = serde_json::from_str(text)
            .map_err(|e| CaptureError::config(format!("invalid capture config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values no encoder can work with.
    pub fn validate(&self) -> CaptureResult<()> {
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(CaptureError::validation("fps must be non-zero"));
        }
        if self.bitrate_bps == 0 {
            return Err(CaptureError::validation("bitrate_bps must be non-zero"));
        }
        if self.timeslice_ms == 0 {
            return Err(CaptureError::validation("timeslice_ms must be non-zero"));
        }
        if self.stream_capacity == 0 {
            return Err(CaptureError::validation("stream_capacity must be non-zero"));
        }
        if self.file_name.trim().is_empty()
            || self.file_name.contains(['/', '\\'])
            || self.file_name == "."
            || self.file_name == ".."
        {
            return Err(CaptureError::validation(format!(
                "file_name '{}' must be a plain file name",
                self.file_name
            )));
        }
        if self.mime_type.trim().is_empty() {
            return Err(CaptureError::validation("mime_type must be non-empty"));
        }
        Ok(())
    }

    /// Encoder timeslice as a duration.
    pub fn timeslice(&self) -> Duration {
        Duration::from_millis(self.timeslice_ms)
    }

    /// Options handed to the encoder backend on start.
    pub fn encoder_opts(&self) -> EncoderOpts {
        EncoderOpts {
            codec: self.codec,
            bitrate_bps: self.bitrate_bps,
            timeslice: self.timeslice(),
            mime_type: self.mime_type.clone(),
            bg_rgba: self.bg_rgba,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/config.rs"]
mod tests;
