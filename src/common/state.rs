//! Global state machine.
//!
//! Shooters, projectiles and combat only run in `InGame`. Pausing is a time
//! concern (`Time<Virtual>`), not a state.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    #[default]
    InGame,
}
