//! Animation drivers: the meteor field and the text reveal.
//!
//! [`Scene`] advances both on one clock. The meteor simulation runs at a fixed
//! [`SIM_RATE_HZ`] regardless of how often the scene is ticked.

/// Meteor particle field.
pub mod meteors;
/// Typewriter text reveal.
pub mod reveal;

use crate::scene::meteors::MeteorField;
use crate::scene::reveal::TextReveal;
use std::time::Duration;

/// Meteor simulation steps per second of scene time.
pub const SIM_RATE_HZ: u32 = 60;

/// The animated content rendered every frame.
#[derive(Clone, Debug)]
pub struct Scene {
    meteors: MeteorField,
    reveal: TextReveal,
    time: Duration,
    sim_steps: u64,
}

impl Scene {
    /// Default meteor field seeded with `seed` and a halted reveal.
    pub fn new(seed: u64) -> Self {
        Self::from_parts(MeteorField::new(seed), TextReveal::default())
    }

    /// Build a scene from its drivers, at time zero.
    pub fn from_parts(meteors: MeteorField, reveal: TextReveal) -> Self {
        Self {
            meteors,
            reveal,
            time: Duration::ZERO,
            sim_steps: 0,
        }
    }

    /// Scene time since creation.
    pub fn time(&self) -> Duration {
        self.time
    }

    /// Meteor driver.
    pub fn meteors(&self) -> &MeteorField {
        &self.meteors
    }

    /// Text reveal driver.
    pub fn reveal(&self) -> &TextReveal {
        &self.reveal
    }

    /// Mutable text reveal driver.
    pub fn reveal_mut(&mut self) -> &mut TextReveal {
        &mut self.reveal
    }

    /// Move scene time forward by `dt` and bring both drivers up to date.
    ///
    /// Returns the number of meteor steps taken.
    pub fn advance(&mut self, dt: Duration) -> u64 {
        self.time += dt;
        let due = (self.time.as_secs_f64() * f64::from(SIM_RATE_HZ)).floor() as u64;
        let steps = due.saturating_sub(self.sim_steps);
        self.meteors.step_n(steps);
        self.sim_steps += steps;
        self.reveal.update(self.time);
        steps
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/mod.rs"]
mod tests;
