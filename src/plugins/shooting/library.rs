//! Registry of shot patterns and power-ups.
//!
//! Patterns reference each other (`next_patterns`) and may form cycles, so they are
//! addressed by id rather than owned pointers.

use bevy::prelude::*;

use super::pattern::ShotPattern;
use super::shooter::{ShotContext, Shooter};
use super::messages::ShotPowerUpExpired;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternId(u32);

impl PatternId {
    /// Id carried by a pattern that has not been added to a library yet.
    pub const UNREGISTERED: Self = Self(u32::MAX);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PowerUpId(u32);

/// Temporarily replaces a shooter's pattern.
#[derive(Debug, Clone)]
pub struct ShotPatternPowerUp {
    pub name: String,
    pub pattern: PatternId,
    /// Seconds. Re-applying restarts the countdown, it never stacks.
    pub duration: f32,
}

impl ShotPatternPowerUp {
    pub fn new(name: impl Into<String>, pattern: PatternId, duration: f32) -> Self {
        Self { name: name.into(), pattern, duration }
    }

    /// Runs once the power-up has fully expired on `shooter`.
    pub fn end(
        &self,
        id: PowerUpId,
        shooter: &mut Shooter,
        library: &ShotLibrary,
        ctx: &mut ShotContext,
    ) {
        if shooter.is_active(self.pattern) {
            if let Some(pattern) = library.pattern(self.pattern) {
                shooter.stop_shooting(pattern, &ctx.clock);
            }
        }

        ctx.expired.push(ShotPowerUpExpired { shooter: ctx.shooter, power_up: id });
        info!("Power-up '{}' expired on {:?}", self.name, ctx.shooter);
    }
}

#[derive(Resource, Debug, Default)]
pub struct ShotLibrary {
    patterns: Vec<ShotPattern>,
    power_ups: Vec<ShotPatternPowerUp>,
}

impl ShotLibrary {
    pub fn add_pattern(&mut self, mut pattern: ShotPattern) -> PatternId {
        debug_assert!(
            pattern.looping || pattern.loops_before_switch == 0,
            "pattern '{}' sets loops_before_switch without looping",
            pattern.name
        );

        let id = PatternId(self.patterns.len() as u32);
        pattern.id = id;
        self.patterns.push(pattern);
        id
    }

    pub fn pattern(&self, id: PatternId) -> Option<&ShotPattern> {
        self.patterns.get(id.0 as usize)
    }

    pub fn pattern_mut(&mut self, id: PatternId) -> Option<&mut ShotPattern> {
        self.patterns.get_mut(id.0 as usize)
    }

    /// Chain `to` after `from`. Returns `false` if either id is unknown.
    pub fn link(&mut self, from: PatternId, to: PatternId) -> bool {
        if self.pattern(to).is_none() {
            return false;
        }
        let Some(pattern) = self.pattern_mut(from) else {
            return false;
        };
        pattern.next_patterns.push(to);
        true
    }

    pub fn add_power_up(&mut self, power_up: ShotPatternPowerUp) -> PowerUpId {
        let id = PowerUpId(self.power_ups.len() as u32);
        self.power_ups.push(power_up);
        id
    }

    pub fn power_up(&self, id: PowerUpId) -> Option<&ShotPatternPowerUp> {
        self.power_ups.get(id.0 as usize)
    }

    pub fn patterns(&self) -> impl Iterator<Item = &ShotPattern> {
        self.patterns.iter()
    }
}
