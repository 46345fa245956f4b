//! Rendering side: rasterize the scene and publish frames on a capturable surface.

/// World-to-pixel projection.
pub mod camera;
/// `vello_cpu` scene renderer.
pub mod cpu;
/// Rendered frame buffer.
pub mod frame;
/// Capturable surface and its frame streams.
pub mod surface;
pub(crate) mod text;
