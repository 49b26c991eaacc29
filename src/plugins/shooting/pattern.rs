//! Shot patterns: declarative config plus the step/loop state machine.
//!
//! A pattern holds no run state. Everything that changes while it runs lives in the
//! shooter's [`PatternRecord`](super::shooter::PatternRecord) for that pattern, so one
//! pattern can run on many shooters at once.
//!
//! ```text
//!  shoot ─► init ─► pre_step ─► step … (shots times, step_delay apart)
//!                      │
//!                      └─ shots_fired == shots ─► add_loop ─┬─ done ─► stop ─► transition
//!                                                           └─ init, wait pattern_cooldown
//! ```

use std::sync::Arc;

use bevy::prelude::*;

use crate::plugins::projectiles::behaviours::ProjectileBehaviour;
use crate::plugins::projectiles::components::{ProjectileInfo, ProjectileTemplate};
use crate::plugins::projectiles::messages::SpawnProjectileRequest;

use super::library::{PatternId, ShotLibrary};
use super::shooter::{ShotContext, Shooter};

/// Geometry of one step: the `init`/`step` pair of a pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatternKind {
    /// One projectile along the aim vector.
    Aimed,
    /// `count` projectiles fanned evenly over `arc_degrees`, centred on the aim vector.
    Spread { count: u32, arc_degrees: f32 },
    /// `count` projectiles evenly around a circle; the circle turns by
    /// `spin_per_step` degrees after every step (0 = static ring, otherwise a spiral).
    Ring { count: u32, spin_per_step: f32 },
}

#[derive(Debug, Clone)]
pub struct ShotPattern {
    pub(super) id: PatternId,
    pub name: String,
    pub kind: PatternKind,
    pub projectile: Arc<ProjectileTemplate>,
    pub info: Arc<ProjectileInfo>,
    /// Added to every projectile on top of `info.behaviours`.
    pub behaviours: Vec<Arc<dyn ProjectileBehaviour>>,
    pub shots: u32,
    /// Fire all `shots` steps at once, then wait `pattern_cooldown`.
    pub instant: bool,
    pub looping: bool,
    /// Loops before the pattern stops and transitions; 0 = forever.
    pub loops_before_switch: u32,
    /// Seconds between loops/restarts.
    pub pattern_cooldown: f32,
    pub bypass_shooter_cooldown: bool,
    /// Seconds between steps.
    pub step_delay: f32,
    pub next_patterns: Vec<PatternId>,
    pub next_pattern_switch_delay: f32,
    pub flip_shoot_origin: bool,
}

impl ShotPattern {
    pub fn new(
        name: impl Into<String>,
        kind: PatternKind,
        projectile: Arc<ProjectileTemplate>,
        info: Arc<ProjectileInfo>,
    ) -> Self {
        Self {
            id: PatternId::UNREGISTERED,
            name: name.into(),
            kind,
            projectile,
            info,
            behaviours: Vec::new(),
            shots: 1,
            instant: false,
            looping: false,
            loops_before_switch: 0,
            pattern_cooldown: 0.0,
            bypass_shooter_cooldown: false,
            step_delay: 0.0,
            next_patterns: Vec::new(),
            next_pattern_switch_delay: 0.0,
            flip_shoot_origin: false,
        }
    }

    pub fn with_shots(mut self, shots: u32) -> Self {
        self.shots = shots;
        self
    }

    pub fn with_step_delay(mut self, secs: f32) -> Self {
        self.step_delay = secs;
        self
    }

    pub fn with_instant(mut self, instant: bool) -> Self {
        self.instant = instant;
        self
    }

    /// Loop `loops_before_switch` times (0 = forever).
    pub fn with_looping(mut self, loops_before_switch: u32) -> Self {
        self.looping = true;
        self.loops_before_switch = loops_before_switch;
        self
    }

    pub fn with_pattern_cooldown(mut self, secs: f32) -> Self {
        self.pattern_cooldown = secs;
        self
    }

    pub fn with_bypass_shooter_cooldown(mut self, bypass: bool) -> Self {
        self.bypass_shooter_cooldown = bypass;
        self
    }

    pub fn with_behaviour(mut self, behaviour: Arc<dyn ProjectileBehaviour>) -> Self {
        self.behaviours.push(behaviour);
        self
    }

    pub fn with_next(mut self, next: PatternId) -> Self {
        self.next_patterns.push(next);
        self
    }

    pub fn with_switch_delay(mut self, secs: f32) -> Self {
        self.next_pattern_switch_delay = secs;
        self
    }

    pub fn with_flipped_origin(mut self, flip: bool) -> Self {
        self.flip_shoot_origin = flip;
        self
    }

    #[inline]
    pub fn id(&self) -> PatternId {
        self.id
    }

    // -------------------------------------------------------------------------
    // Geometry hooks
    // -------------------------------------------------------------------------

    /// Runs when the pattern starts and on every new loop.
    pub fn init(&self, shooter: &mut Shooter) {
        match self.kind {
            PatternKind::Aimed | PatternKind::Spread { .. } => {}
            PatternKind::Ring { .. } => shooter.record_mut(self.id).angle = 0.0,
        }
    }

    /// Emits this step's projectiles.
    pub fn step(&self, shooter: &mut Shooter, ctx: &mut ShotContext) {
        let position = self.spawn_position(shooter, ctx);
        let target = self.fetch_target(shooter);
        let aim = target.normalize_or(self.projectile.up());

        match self.kind {
            PatternKind::Aimed => self.spawn(ctx, position, target, aim),
            PatternKind::Spread { count, arc_degrees } => {
                for i in 0..count {
                    let offset = if count == 1 {
                        0.0
                    } else {
                        -arc_degrees / 2.0 + arc_degrees * i as f32 / (count - 1) as f32
                    };
                    let dir = Vec2::from_angle(offset.to_radians()).rotate(aim);
                    self.spawn(ctx, position, target, dir);
                }
            }
            PatternKind::Ring { count, spin_per_step } => {
                let record = shooter.record_mut(self.id);
                for i in 0..count {
                    let angle = record.angle + 360.0 * i as f32 / count as f32;
                    let dir = Vec2::from_angle(angle.to_radians()).rotate(aim);
                    self.spawn(ctx, position, target, dir);
                }
                record.angle = (record.angle + spin_per_step) % 360.0;
            }
        }
    }

    fn spawn(&self, ctx: &mut ShotContext, position: Vec2, target: Vec2, direction: Vec2) {
        ctx.spawns.push(SpawnProjectileRequest {
            shooter: ctx.shooter,
            pattern: self.id,
            position,
            rotation: self.projectile.rotation,
            target,
            direction,
        });
    }

    /// Shooter position (or the record's spawn override), nudged half the shooter's
    /// height up, or down with `flip_shoot_origin`.
    pub fn spawn_position(&self, shooter: &Shooter, ctx: &ShotContext) -> Vec2 {
        let base = shooter
            .record(self.id)
            .and_then(|r| r.spawn_location)
            .unwrap_or(ctx.origin);
        let offset = ctx.scale_y / 2.0;
        base + Vec2::new(0.0, if self.flip_shoot_origin { -offset } else { offset })
    }

    /// The record's forced aim vector when set and non-zero, else the template's up vector.
    pub fn fetch_target(&self, shooter: &Shooter) -> Vec2 {
        shooter
            .record(self.id)
            .and_then(|r| r.forced_target)
            .filter(|t| *t != Vec2::ZERO)
            .unwrap_or_else(|| self.projectile.up())
    }

    // -------------------------------------------------------------------------
    // State machine
    // -------------------------------------------------------------------------

    /// Fire a whole loop at once. Returns seconds until the next call.
    pub fn instant(&self, shooter: &mut Shooter, ctx: &mut ShotContext) -> f32 {
        for _ in 0..self.shots {
            self.pre_step(shooter, ctx);
        }

        if shooter.record(self.id).is_some_and(|r| r.shots_fired == self.shots) {
            self.add_loop(shooter, ctx);
        }

        if !shooter.can_loop(self, &ctx.clock) {
            return shooter.loop_cooldown_remaining(self, &ctx.clock);
        }

        self.pattern_cooldown
    }

    /// Advance one step. `None` means nothing is pending: the pattern is inactive or
    /// just finished its last loop.
    pub fn pre_step(&self, shooter: &mut Shooter, ctx: &mut ShotContext) -> Option<f32> {
        let record = shooter.record(self.id)?;
        if !record.active {
            return None;
        }

        if record.shots_fired == self.shots && self.add_loop(shooter, ctx) {
            return None;
        }

        if !shooter.can_loop(self, &ctx.clock) {
            return Some(shooter.loop_cooldown_remaining(self, &ctx.clock));
        }

        self.step(shooter, ctx);
        shooter.record_mut(self.id).shots_fired += 1;

        Some(self.step_delay)
    }

    /// Close a loop. Returns `true` if the pattern is done and has been stopped.
    pub fn add_loop(&self, shooter: &mut Shooter, ctx: &mut ShotContext) -> bool {
        let record = shooter.record_mut(self.id);
        record.shots_fired = 0;
        record.loops += 1;
        record.last_loop_ms = Some(ctx.clock.now_ms);

        if self.is_done_looping(shooter) {
            shooter.stop_shooting(self, &ctx.clock);
            return true;
        }

        self.init(shooter);
        false
    }

    pub fn is_done_looping(&self, shooter: &Shooter) -> bool {
        let loops = shooter.record(self.id).map_or(0, |r| r.loops);

        (self.looping && loops >= self.loops_before_switch && self.loops_before_switch != 0)
            || (!self.looping && loops >= 1)
    }

    /// Start every follow-up pattern; each one passes its own `can_shoot` gate.
    pub fn transition(&self, shooter: &mut Shooter, library: &ShotLibrary, ctx: &mut ShotContext) {
        for next in &self.next_patterns {
            let Some(pattern) = library.pattern(*next) else {
                warn!("Pattern '{}' transitions to unknown pattern {:?}", self.name, next);
                continue;
            };
            shooter.shoot(pattern, ctx);
        }
    }
}
