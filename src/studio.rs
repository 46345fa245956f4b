use crate::capture::artifact::{Artifact, ArtifactSaver};
use crate::capture::config::CaptureConfig;
use crate::capture::controller::CaptureController;
use crate::encode::encoder::EncoderBackend;
use crate::foundation::core::{Canvas, FrameIndex};
use crate::foundation::error::CaptureResult;
use crate::render::cpu::SceneRenderer;
use crate::render::surface::CanvasSurface;
use crate::scene::Scene;
use std::path::PathBuf;
use std::time::Duration;

/// Settings for a [`Studio`].
#[derive(Clone, Debug)]
pub struct StudioOpts {
    /// Drawable size.
    pub canvas: Canvas,
    /// Seed for the meteor field.
    pub seed: u64,
    /// Font file for the reveal text. Without one, only the meteors are drawn.
    pub font: Option<PathBuf>,
    /// Capture settings.
    pub capture: CaptureConfig,
}

impl Default for StudioOpts {
    fn default() -> Self {
        Self {
            canvas: Canvas::new(1280, 720),
            seed: 0,
            font: None,
            capture: CaptureConfig::default(),
        }
    }
}

/// The whole page: scene, renderer, surface and capture controller on one tick.
///
/// `tick` is the per-frame update. The record toggle and download mirror the two buttons a user
/// would press.
pub struct Studio {
    scene: Scene,
    renderer: SceneRenderer,
    surface: CanvasSurface,
    controller: CaptureController,
    next_frame: FrameIndex,
}

impl Studio {
    /// Build a studio and present its first frame.
    pub fn new(
        opts: StudioOpts,
        backend: Box<dyn EncoderBackend>,
        saver: Box<dyn ArtifactSaver>,
    ) -> CaptureResult<Self> {
        let mut renderer = SceneRenderer::new(opts.canvas)?;
        if let Some(font) = opts.font.as_ref() {
            renderer = renderer.with_font_file(font)?;
        }
        let surface = CanvasSurface::new(opts.canvas, opts.capture.stream_capacity);
        let controller = CaptureController::new(opts.capture, backend, saver)?;

        let mut studio = Self {
            scene: Scene::new(opts.seed),
            renderer,
            surface,
            controller,
            next_frame: FrameIndex(0),
        };
        studio.tick(Duration::ZERO)?;
        Ok(studio)
    }

    /// Advance the scene by `dt`, render, present, and collect encoder output.
    pub fn tick(&mut self, dt: Duration) -> CaptureResult<FrameIndex> {
        self.scene.advance(dt);
        let frame = self.renderer.render(&self.scene)?;
        self.surface.present(frame, self.scene.time())?;
        self.controller.pump();

        let idx = self.next_frame;
        self.next_frame = FrameIndex(idx.0 + 1);
        Ok(idx)
    }

    /// Start recording when idle, stop when recording. Returns whether recording afterwards.
    ///
    /// Starting restarts the text reveal so every recording begins from scratch.
    #[tracing::instrument(skip(self))]
    pub fn toggle_recording(&mut self) -> CaptureResult<bool> {
        if self.controller.is_recording() {
            self.controller.stop_recording();
            self.scene.reveal_mut().halt();
            return Ok(false);
        }

        let now = self.scene.time();
        self.scene.reveal_mut().restart(now);
        // The stream's first frame should already show the cleared text.
        let frame = self.renderer.render(&self.scene)?;
        self.surface.present(frame, now)?;

        if let Err(e) = self.controller.start_recording(&mut self.surface) {
            self.scene.reveal_mut().halt();
            return Err(e);
        }
        Ok(true)
    }

    /// Export what was recorded. `Ok(None)` when nothing was captured.
    pub fn download(&mut self) -> CaptureResult<Option<Artifact>> {
        self.controller.download_video()
    }

    /// Whether a recording is running.
    pub fn is_recording(&self) -> bool {
        self.controller.is_recording()
    }

    /// Change the drawable size. A running recording is stopped first.
    pub fn resize(&mut self, canvas: Canvas) -> CaptureResult<()> {
        if self.controller.is_recording() {
            self.controller.stop_recording();
            self.scene.reveal_mut().halt();
        }
        self.renderer.resize(canvas)?;
        self.surface.resize(canvas);
        Ok(())
    }

    /// Frames ticked so far.
    pub fn frames_ticked(&self) -> u64 {
        self.next_frame.0
    }

    /// Animated content.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Capture surface.
    pub fn surface(&self) -> &CanvasSurface {
        &self.surface
    }

    /// Mutable capture surface.
    pub fn surface_mut(&mut self) -> &mut CanvasSurface {
        &mut self.surface
    }

    /// Capture controller.
    pub fn controller(&self) -> &CaptureController {
        &self.controller
    }
}

#[cfg(test)]
#[path = "../tests/unit/studio.rs"]
mod tests;
