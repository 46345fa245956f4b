use crate::foundation::core::{Affine, BezPath, Canvas, Point};
use crate::foundation::error::{CaptureError, CaptureResult};
use crate::foundation::math::unit_to_u8;
use crate::render::camera::Camera;
use crate::render::frame::FrameRGBA;
use crate::render::text::{TextBrushRgba8, TextLayoutEngine};
use crate::scene::Scene;
use crate::scene::meteors::{Meteor, TrailPoint};
use std::path::Path;
use std::sync::Arc;

/// Scene background (`#000814`), straight RGBA8.
pub const BACKGROUND_RGBA: [u8; 4] = [0x00, 0x08, 0x14, 0xff];
/// Opacity applied to every meteor trail.
pub const TRAIL_OPACITY: f64 = 0.8;
/// Cap height of the reveal text in world units.
pub const TEXT_SIZE: f64 = 0.8;
/// World-space baselines of the two reveal lines.
pub const TEXT_BASELINES: [f64; 2] = [1.0, -0.5];

struct LineCache {
    text: String,
    layout: Option<Arc<parley::Layout<TextBrushRgba8>>>,
    size_px: f32,
}

struct TextState {
    engine: TextLayoutEngine,
    font: vello_cpu::peniko::FontData,
    lines: [LineCache; 2],
}

/// Rasterizes a [`Scene`] into premultiplied RGBA8 frames with `vello_cpu`.
pub struct SceneRenderer {
    canvas: Canvas,
    camera: Camera,
    ctx: Option<vello_cpu::RenderContext>,
    text: Option<TextState>,
}

impl SceneRenderer {
    /// Renderer for `canvas` with the default camera and no font.
    pub fn new(canvas: Canvas) -> CaptureResult<Self> {
        canvas_dims_u16(canvas)?;
        Ok(Self {
            canvas,
            camera: Camera::default(),
            ctx: None,
            text: None,
        })
    }

    /// Use `font_bytes` (TTF/OTF) for the reveal text.
    pub fn with_font_bytes(mut self, font_bytes: Vec<u8>) -> CaptureResult<Self> {
        let engine = TextLayoutEngine::new(&font_bytes)?;
        tracing::debug!(family = engine.family_name(), "font loaded");
        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        self.text = Some(TextState {
            engine,
            font,
            lines: [LineCache::empty(), LineCache::empty()],
        });
        Ok(self)
    }

    /// Read a font file and use it for the reveal text.
    pub fn with_font_file(self, path: impl AsRef<Path>) -> CaptureResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            CaptureError::render(format!("failed to read font '{}': {e}", path.display()))
        })?;
        self.with_font_bytes(bytes)
    }

    /// Whether reveal text will be drawn.
    pub fn has_font(&self) -> bool {
        self.text.is_some()
    }

    /// Output size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Projection used for the scene plane.
    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Change the output size. Cached text layouts are rebuilt on the next render.
    pub fn resize(&mut self, canvas: Canvas) -> CaptureResult<()> {
        canvas_dims_u16(canvas)?;
        self.canvas = canvas;
        if let Some(text) = self.text.as_mut() {
            text.lines = [LineCache::empty(), LineCache::empty()];
        }
        Ok(())
    }

    /// Render the current state of `scene`.
    pub fn render(&mut self, scene: &Scene) -> CaptureResult<FrameRGBA> {
        let (w, h) = canvas_dims_u16(self.canvas)?;
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();

        let out = self.draw(&mut ctx, scene).and_then(|()| {
            let mut pixmap = vello_cpu::Pixmap::new(w, h);
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            Ok(FrameRGBA {
                width: self.canvas.width,
                height: self.canvas.height,
                data: pixmap.data_as_u8_slice().to_vec(),
                premultiplied: true,
            })
        });
        self.ctx = Some(ctx);
        out
    }

    fn draw(&mut self, ctx: &mut vello_cpu::RenderContext, scene: &Scene) -> CaptureResult<()> {
        let [r, g, b, a] = BACKGROUND_RGBA;
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.canvas.width),
            f64::from(self.canvas.height),
        ));

        let world = self.camera.world_to_screen(self.canvas);
        ctx.set_transform(affine_to_cpu(world));
        for meteor in scene.meteors().meteors() {
            draw_trail(ctx, meteor);
        }

        let lines = scene.reveal().lines();
        self.draw_text(ctx, lines)
    }

    fn draw_text(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        lines: [&str; 2],
    ) -> CaptureResult<()> {
        let Some(text) = self.text.as_mut() else {
            return Ok(());
        };
        let scale = self.camera.pixels_per_unit(self.canvas);
        let size_px = (TEXT_SIZE * scale) as f32;

        for (i, line) in lines.into_iter().enumerate() {
            let cache = &mut text.lines[i];
            if cache.text != line || cache.size_px != size_px {
                cache.layout = if line.is_empty() {
                    None
                } else {
                    Some(Arc::new(text.engine.layout_line(
                        line,
                        size_px,
                        TextBrushRgba8::WHITE,
                    )?))
                };
                cache.text = line.to_string();
                cache.size_px = size_px;
            }
            let Some(layout) = cache.layout.as_ref() else {
                continue;
            };

            let baseline = layout
                .lines()
                .next()
                .map(|l| f64::from(l.metrics().baseline))
                .unwrap_or(0.0);
            // Centered horizontally on the scene origin, baseline on the line's world y.
            let anchor = self
                .camera
                .project(self.canvas, Point::new(0.0, TEXT_BASELINES[i]));
            let origin = Affine::translate((
                anchor.x - f64::from(layout.width()) * 0.5,
                anchor.y - baseline,
            ));
            ctx.set_transform(affine_to_cpu(origin));
            fill_layout(ctx, &text.font, layout);
        }
        Ok(())
    }
}

impl LineCache {
    fn empty() -> Self {
        Self {
            text: String::new(),
            layout: None,
            size_px: 0.0,
        }
    }
}

fn draw_trail(ctx: &mut vello_cpu::RenderContext, meteor: &Meteor) {
    let trail: Vec<TrailPoint> = meteor.trail().collect();
    for seg in trail.windows(2) {
        let (a, b) = (seg[0], seg[1]);
        let mut quad = BezPath::new();
        quad.move_to((a.center.x, a.center.y + a.half_width));
        quad.line_to((b.center.x, b.center.y + b.half_width));
        quad.line_to((b.center.x, b.center.y - b.half_width));
        quad.line_to((a.center.x, a.center.y - a.half_width));
        quad.close_path();

        let [r, g, bl] = a.rgb;
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            unit_to_u8(r),
            unit_to_u8(g),
            unit_to_u8(bl),
            unit_to_u8(TRAIL_OPACITY),
        ));
        ctx.fill_path(&bezpath_to_cpu(&quad));
    }
}

fn fill_layout(
    ctx: &mut vello_cpu::RenderContext,
    font: &vello_cpu::peniko::FontData,
    layout: &parley::Layout<TextBrushRgba8>,
) {
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

fn canvas_dims_u16(canvas: Canvas) -> CaptureResult<(u16, u16)> {
    if canvas.width == 0 || canvas.height == 0 {
        return Err(CaptureError::render("canvas width/height must be non-zero"));
    }
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| CaptureError::render("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| CaptureError::render("canvas height exceeds u16"))?;
    Ok((w, h))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
