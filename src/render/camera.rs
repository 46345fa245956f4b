use crate::foundation::core::{Affine, Canvas, Point};

/// Perspective camera looking down -z at the z = 0 plane the scene lives on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Distance from the camera to the scene plane.
    pub distance: f64,
    /// Vertical field of view in degrees.
    pub fov_y_deg: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            distance: 10.0,
            fov_y_deg: 75.0,
        }
    }
}

impl Camera {
    /// Half of the world-space height visible on the scene plane.
    pub fn visible_half_height(&self) -> f64 {
        self.distance * (self.fov_y_deg.to_radians() * 0.5).tan()
    }

    /// Scale from world units to pixels for `canvas`.
    pub fn pixels_per_unit(&self, canvas: Canvas) -> f64 {
        f64::from(canvas.height) * 0.5 / self.visible_half_height()
    }

    /// World (y up, origin at center) to pixel (y down, origin top-left) transform.
    pub fn world_to_screen(&self, canvas: Canvas) -> Affine {
        let s = self.pixels_per_unit(canvas);
        Affine::new([
            s,
            0.0,
            0.0,
            -s,
            f64::from(canvas.width) * 0.5,
            f64::from(canvas.height) * 0.5,
        ])
    }

    /// Pixel position of world point `p`.
    pub fn project(&self, canvas: Canvas, p: Point) -> Point {
        self.world_to_screen(canvas) * p
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/camera.rs"]
mod tests;
