//! Per-projectile behaviours and the manager that drives them.
//!
//! Behaviours are shared, stateless configuration (`Arc<dyn ProjectileBehaviour>`).
//! Anything that varies per projectile is derived from the [`ProjectileMotion`]
//! view: age, spawn point, target, current direction.

use std::f32::consts::TAU;
use std::fmt;
use std::sync::Arc;

use bevy::prelude::*;

/// Mutable view of a projectile handed to behaviours.
pub struct ProjectileMotion<'a> {
    pub transform: &'a mut Transform,
    pub direction: &'a mut Vec2,
    pub start: Vec2,
    pub target: Vec2,
    /// Seconds since the projectile was shot.
    pub age: f32,
    /// Fixed delta for this tick; zero for `init`/`die`.
    pub dt: f32,
}

impl ProjectileMotion<'_> {
    #[inline]
    pub fn position(&self) -> Vec2 {
        self.transform.translation.truncate()
    }

    #[inline]
    pub fn translate(&mut self, delta: Vec2) {
        self.transform.translation += delta.extend(0.0);
    }
}

pub trait ProjectileBehaviour: fmt::Debug + Send + Sync + 'static {
    fn init(&self, _motion: &mut ProjectileMotion) {}

    fn movement(&self, motion: &mut ProjectileMotion);

    fn die(&self, _motion: &mut ProjectileMotion) {}
}

#[derive(Debug, Clone)]
struct BehaviourEntry {
    behaviour: Arc<dyn ProjectileBehaviour>,
    started: bool,
}

/// The behaviour set of one projectile, each with its "started" flag.
///
/// Entries are unique by identity; insertion order carries no meaning.
#[derive(Component, Debug, Clone, Default)]
pub struct BehaviourManager {
    entries: Vec<BehaviourEntry>,
}

impl BehaviourManager {
    /// Replace the set with `base ∪ extra`, all not started.
    pub fn rebuild(
        &mut self,
        base: &[Arc<dyn ProjectileBehaviour>],
        extra: &[Arc<dyn ProjectileBehaviour>],
    ) {
        self.entries.clear();
        for behaviour in base.iter().chain(extra) {
            self.insert(Arc::clone(behaviour));
        }
    }

    /// Returns `false` if the behaviour was already attached.
    pub fn insert(&mut self, behaviour: Arc<dyn ProjectileBehaviour>) -> bool {
        if self.contains(&behaviour) {
            return false;
        }
        self.entries.push(BehaviourEntry { behaviour, started: false });
        true
    }

    pub fn contains(&self, behaviour: &Arc<dyn ProjectileBehaviour>) -> bool {
        self.entries.iter().any(|e| Arc::ptr_eq(&e.behaviour, behaviour))
    }

    pub fn is_started(&self, behaviour: &Arc<dyn ProjectileBehaviour>) -> Option<bool> {
        self.entries
            .iter()
            .find(|e| Arc::ptr_eq(&e.behaviour, behaviour))
            .map(|e| e.started)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn init(&mut self, motion: &mut ProjectileMotion) {
        for entry in self.entries.iter_mut().filter(|e| !e.started) {
            entry.behaviour.init(motion);
            entry.started = true;
        }
    }

    pub fn movement(&mut self, motion: &mut ProjectileMotion) {
        for entry in &self.entries {
            entry.behaviour.movement(motion);
        }
    }

    pub fn die(&mut self, motion: &mut ProjectileMotion) {
        for entry in self.entries.iter_mut().filter(|e| e.started) {
            entry.behaviour.die(motion);
            entry.started = false;
        }
    }
}

// -----------------------------------------------------------------------------
// Shipped behaviours
// -----------------------------------------------------------------------------

/// Constant speed along the current direction.
#[derive(Debug, Clone, Copy)]
pub struct LinearMovement {
    pub speed: f32,
}

impl ProjectileBehaviour for LinearMovement {
    fn movement(&self, motion: &mut ProjectileMotion) {
        let step = *motion.direction * self.speed * motion.dt;
        motion.translate(step);
    }
}

/// Speed ramps from `initial_speed` by `acceleration` per second, capped at `max_speed`.
#[derive(Debug, Clone, Copy)]
pub struct AcceleratingMovement {
    pub initial_speed: f32,
    pub acceleration: f32,
    pub max_speed: f32,
}

impl AcceleratingMovement {
    pub fn speed_at(&self, age: f32) -> f32 {
        (self.initial_speed + self.acceleration * age).min(self.max_speed)
    }
}

impl ProjectileBehaviour for AcceleratingMovement {
    fn movement(&self, motion: &mut ProjectileMotion) {
        let step = *motion.direction * self.speed_at(motion.age) * motion.dt;
        motion.translate(step);
    }
}

/// Forward motion plus a sideways sine offset.
#[derive(Debug, Clone, Copy)]
pub struct WaveMovement {
    pub speed: f32,
    pub amplitude: f32,
    /// Oscillations per second.
    pub frequency: f32,
}

impl WaveMovement {
    fn offset_at(&self, age: f32) -> f32 {
        self.amplitude * (age * self.frequency * TAU).sin()
    }
}

impl ProjectileBehaviour for WaveMovement {
    fn movement(&self, motion: &mut ProjectileMotion) {
        let dir = *motion.direction;
        let side = dir.perp();
        // age was already advanced for this tick
        let lateral = self.offset_at(motion.age) - self.offset_at(motion.age - motion.dt);
        motion.translate(dir * self.speed * motion.dt + side * lateral);
    }
}

/// Turns the direction at a constant rate; pair with a movement behaviour to curve.
#[derive(Debug, Clone, Copy)]
pub struct SpinMovement {
    /// Degrees per second, counter-clockwise.
    pub degrees_per_second: f32,
}

impl ProjectileBehaviour for SpinMovement {
    fn movement(&self, motion: &mut ProjectileMotion) {
        let turn = Vec2::from_angle((self.degrees_per_second * motion.dt).to_radians());
        *motion.direction = turn.rotate(*motion.direction);
    }
}
