//! The `Shooter` component: per-pattern run records, power-ups and a small task
//! scheduler standing in for per-pattern coroutines.
//!
//! Every running pattern is a chain of [`ShooterTask`]s. A task runs one
//! `pre_step`/`instant`, then schedules its successor `delay` seconds later.
//! Stopping a pattern only clears `active`; stale tasks notice on wake and drop
//! themselves. A restart bumps the record's `generation`, so tasks from the
//! previous run are dropped even if the record is active again.

use bevy::platform::collections::HashMap;
use bevy::prelude::*;

use crate::common::clock::ShotClock;
use crate::plugins::combat::DamageDealt;
use crate::plugins::projectiles::components::ProjectileInfo;
use crate::plugins::projectiles::messages::SpawnProjectileRequest;

use super::library::{PatternId, PowerUpId, ShotLibrary, ShotPatternPowerUp};
use super::messages::ShotPowerUpExpired;
use super::pattern::ShotPattern;

/// Run state of one pattern on one shooter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternRecord {
    pub active: bool,
    pub shots_fired: u32,
    pub loops: u32,
    pub last_loop_ms: Option<f64>,
    /// Aim vector override; see [`ShotPattern::fetch_target`].
    pub forced_target: Option<Vec2>,
    pub spawn_location: Option<Vec2>,
    /// Ring geometry cursor, degrees.
    pub angle: f32,
    pub generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivePowerUp {
    pub power_up: PowerUpId,
    pub activated_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    PatternStep { pattern: PatternId, generation: u32 },
    Transition { pattern: PatternId },
    PowerUpExpiry { power_up: PowerUpId },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShooterTask {
    pub due_ms: f64,
    pub kind: TaskKind,
}

/// Everything a pattern needs from the world for one shooter during one frame,
/// plus the messages it produced.
#[derive(Debug)]
pub struct ShotContext {
    pub clock: ShotClock,
    pub shooter: Entity,
    pub origin: Vec2,
    pub scale_y: f32,
    pub spawns: Vec<SpawnProjectileRequest>,
    pub expired: Vec<ShotPowerUpExpired>,
}

impl ShotContext {
    pub fn new(shooter: Entity, clock: ShotClock, transform: &Transform) -> Self {
        Self {
            clock,
            shooter,
            origin: transform.translation.truncate(),
            scale_y: transform.scale.y,
            spawns: Vec::new(),
            expired: Vec::new(),
        }
    }
}

#[derive(Component, Debug, Clone, Default)]
pub struct Shooter {
    pub default_pattern: Option<PatternId>,
    /// Seconds between pattern starts, unless a pattern bypasses it.
    pub cooldown: f32,
    pub last_shot_ms: Option<f64>,
    records: HashMap<PatternId, PatternRecord>,
    /// Most recent last.
    power_ups: Vec<ActivePowerUp>,
    tasks: Vec<ShooterTask>,
}

impl Shooter {
    pub fn new(default_pattern: Option<PatternId>, cooldown: f32) -> Self {
        Self {
            default_pattern,
            cooldown,
            ..default()
        }
    }

    // -------------------------------------------------------------------------
    // Records & overrides
    // -------------------------------------------------------------------------

    pub fn record(&self, pattern: PatternId) -> Option<&PatternRecord> {
        self.records.get(&pattern)
    }

    /// Records are created on first use and never removed.
    pub fn record_mut(&mut self, pattern: PatternId) -> &mut PatternRecord {
        self.records.entry(pattern).or_default()
    }

    #[inline]
    pub fn is_active(&self, pattern: PatternId) -> bool {
        self.record(pattern).is_some_and(|r| r.active)
    }

    /// Some pattern is running or about to transition.
    pub fn is_busy(&self) -> bool {
        self.records.values().any(|r| r.active)
            || self.tasks.iter().any(|t| matches!(t.kind, TaskKind::Transition { .. }))
    }

    pub fn set_forced_target(&mut self, pattern: PatternId, target: Option<Vec2>) {
        self.record_mut(pattern).forced_target = target;
    }

    pub fn set_spawn_location(&mut self, pattern: PatternId, location: Option<Vec2>) {
        self.record_mut(pattern).spawn_location = location;
    }

    pub fn power_ups(&self) -> &[ActivePowerUp] {
        &self.power_ups
    }

    pub fn tasks(&self) -> &[ShooterTask] {
        &self.tasks
    }

    // -------------------------------------------------------------------------
    // Gates
    // -------------------------------------------------------------------------

    pub fn can_shoot(&self, pattern: &ShotPattern, clock: &ShotClock) -> bool {
        if clock.paused || self.is_active(pattern.id()) {
            return false;
        }
        if self.cooldown == 0.0 {
            return true;
        }
        if !self.can_loop(pattern, clock) {
            return false;
        }
        if pattern.bypass_shooter_cooldown {
            return true;
        }

        self.last_shot_ms
            .is_none_or(|last| clock.now_ms >= last + f64::from(self.cooldown) * 1000.0)
    }

    pub fn can_loop(&self, pattern: &ShotPattern, clock: &ShotClock) -> bool {
        self.record(pattern.id())
            .and_then(|r| r.last_loop_ms)
            .is_none_or(|last| clock.now_ms >= last + f64::from(pattern.pattern_cooldown) * 1000.0)
    }

    /// Seconds until [`Self::can_loop`] turns true, never negative.
    pub fn loop_cooldown_remaining(&self, pattern: &ShotPattern, clock: &ShotClock) -> f32 {
        let Some(last) = self.record(pattern.id()).and_then(|r| r.last_loop_ms) else {
            return 0.0;
        };
        let deadline = last + f64::from(pattern.pattern_cooldown) * 1000.0;
        (clock.until(deadline) / 1000.0).max(0.0) as f32
    }

    /// Latest power-up's pattern, else the default pattern.
    pub fn current_pattern(&self, library: &ShotLibrary) -> Option<PatternId> {
        self.power_ups
            .last()
            .and_then(|active| library.power_up(active.power_up))
            .map(|power_up| power_up.pattern)
            .or(self.default_pattern)
    }

    // -------------------------------------------------------------------------
    // Power-ups
    // -------------------------------------------------------------------------

    /// Apply or refresh. A refreshed power-up moves to most-recent and keeps its
    /// pending expiry task, which reschedules itself for the new deadline.
    pub fn add_power_up(
        &mut self,
        id: PowerUpId,
        power_up: &ShotPatternPowerUp,
        clock: &ShotClock,
    ) {
        let refreshed = ActivePowerUp { power_up: id, activated_ms: clock.now_ms };

        if let Some(index) = self.power_ups.iter().position(|p| p.power_up == id) {
            self.power_ups.remove(index);
            self.power_ups.push(refreshed);
            return;
        }

        self.power_ups.push(refreshed);
        self.tasks.push(ShooterTask {
            due_ms: clock.after_secs(power_up.duration),
            kind: TaskKind::PowerUpExpiry { power_up: id },
        });
    }

    fn expire_power_up(&mut self, id: PowerUpId, library: &ShotLibrary, ctx: &mut ShotContext) {
        let Some(index) = self.power_ups.iter().position(|p| p.power_up == id) else {
            return;
        };
        let Some(power_up) = library.power_up(id) else {
            self.power_ups.remove(index);
            return;
        };

        let deadline = self.power_ups[index].activated_ms + f64::from(power_up.duration) * 1000.0;
        if ctx.clock.now_ms < deadline {
            self.tasks.push(ShooterTask {
                due_ms: deadline,
                kind: TaskKind::PowerUpExpiry { power_up: id },
            });
            return;
        }

        self.power_ups.remove(index);
        power_up.end(id, self, library, ctx);
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Start `pattern`. The first step runs right away; the rest are scheduled.
    /// Returns `false` if [`Self::can_shoot`] refused.
    pub fn shoot(&mut self, pattern: &ShotPattern, ctx: &mut ShotContext) -> bool {
        if !self.can_shoot(pattern, &ctx.clock) {
            return false;
        }

        self.last_shot_ms = Some(ctx.clock.now_ms);

        let id = pattern.id();
        let record = self.record_mut(id);
        record.shots_fired = 0;
        record.loops = 0;

        pattern.init(self);

        let record = self.record_mut(id);
        record.active = true;
        record.generation = record.generation.wrapping_add(1);
        let generation = record.generation;

        debug!("{:?} starts pattern '{}'", ctx.shooter, pattern.name);
        self.pattern_step(pattern, generation, ctx);
        true
    }

    /// Flag `pattern` inactive and schedule its transition, if it has follow-ups.
    pub fn stop_shooting(&mut self, pattern: &ShotPattern, clock: &ShotClock) {
        self.record_mut(pattern.id()).active = false;

        if !pattern.next_patterns.is_empty() {
            self.tasks.push(ShooterTask {
                due_ms: clock.after_secs(pattern.next_pattern_switch_delay),
                kind: TaskKind::Transition { pattern: pattern.id() },
            });
        }
    }

    /// Stop every tracked pattern, running or not. Each one with follow-ups
    /// schedules its transition, so finished chains can start again.
    pub fn stop_all(&mut self, library: &ShotLibrary, clock: &ShotClock) {
        let tracked: Vec<PatternId> = self.records.keys().copied().collect();

        for id in tracked {
            match library.pattern(id) {
                Some(pattern) => self.stop_shooting(pattern, clock),
                None => self.record_mut(id).active = false,
            }
        }
    }

    /// Run every task due by `ctx.clock`. Tasks scheduled while running (even with
    /// zero delay) wait for the next call. Nothing runs while paused.
    pub fn run_due_tasks(&mut self, library: &ShotLibrary, ctx: &mut ShotContext) {
        if ctx.clock.paused {
            return;
        }

        let now = ctx.clock.now_ms;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.tasks).into_iter().partition(|t| t.due_ms <= now);
        self.tasks = pending;
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));

        for task in due {
            match task.kind {
                TaskKind::PatternStep { pattern, generation } => {
                    let Some(pattern) = library.pattern(pattern) else {
                        continue;
                    };
                    self.pattern_step(pattern, generation, ctx);
                }
                TaskKind::Transition { pattern } => {
                    let Some(pattern) = library.pattern(pattern) else {
                        continue;
                    };
                    pattern.transition(self, library, ctx);
                }
                TaskKind::PowerUpExpiry { power_up } => {
                    self.expire_power_up(power_up, library, ctx);
                }
            }
        }
    }

    fn is_current_run(&self, pattern: PatternId, generation: u32) -> bool {
        self.record(pattern).is_some_and(|r| r.active && r.generation == generation)
    }

    fn pattern_step(&mut self, pattern: &ShotPattern, generation: u32, ctx: &mut ShotContext) {
        if !self.is_current_run(pattern.id(), generation) {
            return;
        }

        let delay = if pattern.instant {
            Some(pattern.instant(self, ctx))
        } else {
            pattern.pre_step(self, ctx)
        };
        let delay = delay.unwrap_or(pattern.step_delay).max(0.0);

        if self.is_current_run(pattern.id(), generation) {
            self.tasks.push(ShooterTask {
                due_ms: ctx.clock.after_secs(delay),
                kind: TaskKind::PatternStep { pattern: pattern.id(), generation },
            });
        }
    }

    /// Build the hit message for `projectile` fired by `shooter`. No modifiers.
    pub fn damage(
        shooter: Entity,
        projectile: Entity,
        info: &ProjectileInfo,
        target: Entity,
    ) -> DamageDealt {
        DamageDealt {
            source: shooter,
            target,
            projectile,
            amount: info.damage,
        }
    }
}
