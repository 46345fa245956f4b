/// Result alias used across the crate.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Error taxonomy for rendering, capture and export.
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    /// The capture target is missing or cannot emit a stream.
    #[error("invalid surface: {0}")]
    InvalidSurface(String),

    /// Stream or encoder acquisition failed while starting a session.
    #[error("recording start error: {0}")]
    RecordingStart(String),

    /// Artifact assembly or the save step failed.
    #[error("export error: {0}")]
    Export(String),

    /// Invalid input values (sizes, rates, config fields).
    #[error("validation error: {0}")]
    Validation(String),

    /// Rasterization or text layout failure.
    #[error("render error: {0}")]
    Render(String),

    /// Encoder process or pipe failure.
    #[error("encode error: {0}")]
    Encode(String),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CaptureError {
    /// Build a [`CaptureError::InvalidSurface`] value.
    pub fn invalid_surface(msg: impl Into<String>) -> Self {
        Self::InvalidSurface(msg.into())
    }

    /// Build a [`CaptureError::RecordingStart`] value.
    pub fn recording_start(msg: impl Into<String>) -> Self {
        Self::RecordingStart(msg.into())
    }

    /// Build a [`CaptureError::Export`] value.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build a [`CaptureError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CaptureError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`CaptureError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`CaptureError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
