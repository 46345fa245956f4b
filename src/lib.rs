//! Meteorcap renders a meteor-shower title animation and records it to a video file.
//!
//! The public API is built around the capture lifecycle:
//!
//! - Render the animated [`Scene`] with a [`SceneRenderer`] and present frames on a
//!   [`CanvasSurface`]
//! - Bind a [`CaptureController`] to the surface to start and stop recording
//! - Download the recorded chunks as one [`Artifact`] through an [`ArtifactSaver`]
//!
//! [`Studio`] wires all of the above onto one per-frame tick.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Recording lifecycle and artifact export.
pub mod capture;
/// Encoder backends producing chunks from a frame stream.
pub mod encode;
/// Scene rasterization and the capturable surface.
pub mod render;
/// Animation drivers.
pub mod scene;
/// Scene, renderer, surface and controller composed on one tick.
pub mod studio;

pub use crate::foundation::core::{Affine, BezPath, Canvas, Fps, FrameIndex, Point, Vec2};
pub use crate::foundation::error::{CaptureError, CaptureResult};

pub use crate::capture::artifact::{Artifact, ArtifactSaver, FileSaver, InMemorySaver};
pub use crate::capture::config::CaptureConfig;
pub use crate::capture::controller::{CaptureController, CaptureState};
pub use crate::encode::encoder::{
    ChunkSender, EncoderBackend, EncoderEvent, EncoderEventKind, EncoderHandle, EncoderOpts,
    SessionId, VideoCodec,
};
pub use crate::encode::ffmpeg::{FfmpegEncoderBackend, is_ffmpeg_on_path};
pub use crate::encode::raw::{RAW_MIME_TYPE, RawEncoderBackend};
pub use crate::render::camera::Camera;
pub use crate::render::cpu::SceneRenderer;
pub use crate::render::frame::FrameRGBA;
pub use crate::render::surface::{CanvasSurface, MediaStream, StreamRecv, Surface};
pub use crate::scene::Scene;
pub use crate::scene::meteors::{Meteor, MeteorField};
pub use crate::scene::reveal::TextReveal;
pub use crate::studio::{Studio, StudioOpts};
