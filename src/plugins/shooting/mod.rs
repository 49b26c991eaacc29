//! Shooting plugin: shot patterns, shooters and power-ups.
//!
//! Hosts talk to it with messages ([`messages::ShootRequest`],
//! [`messages::StopShootingRequest`], [`messages::ApplyShotPowerUp`]). Pattern
//! steps come out as `SpawnProjectileRequest`s for the projectiles plugin.
//!
//! All timing runs on virtual time: pausing the game stalls step waits, cooldowns
//! and power-up durations together.

pub mod library;
pub mod messages;
pub mod pattern;
pub mod shooter;
pub mod systems;

use bevy::prelude::*;

use crate::common::state::GameState;

pub fn plugin(app: &mut App) {
    app.init_resource::<library::ShotLibrary>();

    app.add_message::<messages::ShootRequest>()
        .add_message::<messages::StopShootingRequest>()
        .add_message::<messages::ApplyShotPowerUp>()
        .add_message::<messages::ShotPowerUpExpired>();

    app.add_systems(
        Update,
        systems::drive_shooters.run_if(in_state(GameState::InGame)),
    );
}

#[cfg(test)]
mod tests;
