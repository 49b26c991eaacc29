//! Tunable gameplay constants.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct Tunables {
    pub pixels_per_meter: f32,
    /// Number of projectile slots pre-spawned on startup.
    pub projectile_pool_capacity: usize,
    /// Draw depth for active projectiles.
    pub projectile_z: f32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self { pixels_per_meter: 20.0, projectile_pool_capacity: 512, projectile_z: 2.0 }
    }
}
