//! Shooting requests from hosts (AI, input) and the notifications we send back.

use bevy::prelude::*;

use super::library::{PatternId, PowerUpId};

/// Start a pattern on `shooter`. `None` shoots its current pattern
/// (latest power-up, else the default one).
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShootRequest {
    pub shooter: Entity,
    pub pattern: Option<PatternId>,
}

/// Stop one pattern, or every running pattern with `None`.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct StopShootingRequest {
    pub shooter: Entity,
    pub pattern: Option<PatternId>,
}

#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApplyShotPowerUp {
    pub shooter: Entity,
    pub power_up: PowerUpId,
}

#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShotPowerUpExpired {
    pub shooter: Entity,
    pub power_up: PowerUpId,
}
