use crate::foundation::core::{Point, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Meteors in the default field.
pub const METEOR_COUNT: usize = 30;
/// Trail points per meteor, head included.
pub const TRAIL_LEN: usize = 25;
/// Direction of travel, radians from +x.
pub const METEOR_ANGLE: f64 = std::f64::consts::FRAC_PI_6;

const LANE_COUNT: u32 = 15;
const FIELD_MIN_Y: f64 = -20.0;
const FIELD_HEIGHT: f64 = 40.0;
const ENTRY_X: f64 = -30.0;
const ENTRY_JITTER_X: f64 = 5.0;
const EXIT_X: f64 = 25.0;
const EXIT_Y: f64 = 20.0;

const SPEED_MIN: f64 = 0.2;
const SPEED_MAX: f64 = 0.3;

const TRAIL_STEP: Vec2 = Vec2::new(-0.3, -0.15);
const TRAIL_HALF_WIDTH: f64 = 0.12;
const TRAIL_RGB: [f64; 3] = [0.4, 0.6, 1.0];
const TRAIL_BRIGHTNESS: f64 = 1.8;
const TRAIL_FADE_EXP: f64 = 1.5;

/// One meteor head. Its trail is derived from the head position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Meteor {
    /// Head position in world units.
    pub pos: Point,
    /// World units per simulation step.
    pub speed: f64,
}

/// One point along a meteor trail.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailPoint {
    /// Center of the trail at this point.
    pub center: Point,
    /// Half the trail thickness, measured along y.
    pub half_width: f64,
    /// Linear RGB. Channels may exceed 1 near the head.
    pub rgb: [f64; 3],
}

impl Meteor {
    /// Trail points from the head (index 0) backwards.
    pub fn trail(&self) -> impl Iterator<Item = TrailPoint> + '_ {
        (0..TRAIL_LEN).map(move |j| {
            let t = j as f64 / TRAIL_LEN as f64;
            let fade = (1.0 - t).powf(TRAIL_FADE_EXP) * TRAIL_BRIGHTNESS;
            TrailPoint {
                center: self.pos + TRAIL_STEP * j as f64,
                half_width: TRAIL_HALF_WIDTH * (1.0 - t),
                rgb: TRAIL_RGB.map(|c| c * fade),
            }
        })
    }
}

/// Ambient field of meteors drifting up and to the right.
///
/// A meteor whose head leaves the visible bound re-enters at a random lane on the left. Speeds
/// are fixed per meteor for the life of the field. All randomness comes from one seeded
/// generator, so two fields with the same seed stay identical step for step.
#[derive(Clone, Debug)]
pub struct MeteorField {
    meteors: Vec<Meteor>,
    dir: Vec2,
    rng: StdRng,
}

impl MeteorField {
    /// A field of [`METEOR_COUNT`] meteors.
    pub fn new(seed: u64) -> Self {
        Self::with_count(METEOR_COUNT, seed)
    }

    /// A field of `count` meteors.
    pub fn with_count(count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let entries: Vec<Point> = (0..count).map(|_| entry_point(&mut rng)).collect();
        let meteors = entries
            .into_iter()
            .map(|pos| Meteor {
                pos,
                speed: rng.random_range(SPEED_MIN..SPEED_MAX),
            })
            .collect();
        Self {
            meteors,
            dir: Vec2::new(METEOR_ANGLE.cos(), METEOR_ANGLE.sin()),
            rng,
        }
    }

    /// A field starting from explicit meteors; `seed` drives later re-entries.
    pub fn from_meteors(meteors: Vec<Meteor>, seed: u64) -> Self {
        Self {
            meteors,
            dir: Vec2::new(METEOR_ANGLE.cos(), METEOR_ANGLE.sin()),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Current meteors.
    pub fn meteors(&self) -> &[Meteor] {
        &self.meteors
    }

    /// Advance every meteor by one simulation step, wrapping those that left the bound.
    pub fn step(&mut self) {
        for m in &mut self.meteors {
            m.pos += self.dir * m.speed;
            if m.pos.x > EXIT_X || m.pos.y > EXIT_Y {
                m.pos = entry_point(&mut self.rng);
            }
        }
    }

    /// Advance by `n` simulation steps.
    pub fn step_n(&mut self, n: u64) {
        for _ in 0..n {
            self.step();
        }
    }
}

fn entry_point(rng: &mut StdRng) -> Point {
    let lane_spacing = FIELD_HEIGHT / f64::from(LANE_COUNT);
    let lane = rng.random_range(0..LANE_COUNT);
    let y = FIELD_MIN_Y + f64::from(lane) * lane_spacing + rng.random::<f64>() * lane_spacing * 0.5;
    // Lanes are offset back along the travel line.
    let x = ENTRY_X + rng.random::<f64>() * ENTRY_JITTER_X - y / METEOR_ANGLE.tan();
    Point::new(x, y)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/meteors.rs"]
mod tests;
