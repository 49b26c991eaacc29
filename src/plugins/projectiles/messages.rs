//! Buffered projectile messages.
//!
//! Patterns never touch the pool. They write [`SpawnProjectileRequest`]s and the
//! allocator is the single writer that pops slots and fires them.

use bevy::prelude::*;

use crate::plugins::shooting::library::PatternId;

/// One projectile a pattern step wants fired.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct SpawnProjectileRequest {
    pub shooter: Entity,
    /// Supplies template, info and extra behaviours.
    pub pattern: PatternId,
    pub position: Vec2,
    pub rotation: Quat,
    pub target: Vec2,
    pub direction: Vec2,
}

/// A pooled projectile went live. Hosts play `audio` and may attach effects.
#[derive(Message, Clone, Debug, PartialEq)]
pub struct ProjectileFired {
    pub projectile: Entity,
    pub shooter: Entity,
    pub audio: Option<String>,
}
