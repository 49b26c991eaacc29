//! Shot clock: the game-time view used by shooters.
//!
//! Every timestamp in the shooting state machine is in milliseconds of *virtual*
//! time. Virtual time stops while the game is paused (or its relative speed is 0),
//! so cooldowns and step waits stall with it.

use bevy::prelude::*;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShotClock {
    pub now_ms: f64,
    pub paused: bool,
}

impl ShotClock {
    pub fn new(now_ms: f64) -> Self {
        Self { now_ms, paused: false }
    }

    pub fn from_virtual(time: &Time<Virtual>) -> Self {
        Self {
            now_ms: time.elapsed_secs_f64() * 1000.0,
            paused: is_paused(time),
        }
    }

    /// Milliseconds from now until `deadline_ms`; negative once it has passed.
    #[inline]
    pub fn until(&self, deadline_ms: f64) -> f64 {
        deadline_ms - self.now_ms
    }

    /// Absolute timestamp `secs` seconds from now.
    #[inline]
    pub fn after_secs(&self, secs: f32) -> f64 {
        self.now_ms + f64::from(secs) * 1000.0
    }
}

/// Time scale gate shared by shooters and per-tick projectile updates.
#[inline]
pub fn is_paused(time: &Time<Virtual>) -> bool {
    time.is_paused() || time.relative_speed() == 0.0
}
