//! Recording lifecycle: start/stop/download over an encoder backend.
//!
//! [`controller::CaptureController`] owns the session state and the chunk buffer.
//! [`artifact::ArtifactSaver`] is the "trigger a save" primitive the finished artifact is
//! handed to.

/// Assembled output and the savers it is handed to.
pub mod artifact;
/// Fixed capture settings with JSON overrides.
pub mod config;
/// Start/stop/download state machine.
pub mod controller;
