//! Encoders that turn a live frame stream into ordered byte chunks.

/// Backend/handle traits and the event channel encoders report through.
pub mod encoder;
/// `ffmpeg`-based WebM encoder (system `ffmpeg`).
pub mod ffmpeg;
/// Uncompressed encoder for tests and debugging.
pub mod raw;
