//! Collision layers.

use avian2d::prelude::*;

#[derive(PhysicsLayer, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    #[default]
    Default,
    World,
    Player,
    Enemy,
    PlayerProjectile,
    EnemyProjectile,
    /// Fired by a shooter without a `Team`.
    NeutralProjectile,
}

/// Membership kept while a projectile sits in the pool, with no filters:
/// pooled projectiles collide with nothing and never produce contact events.
#[inline]
pub fn inactive_projectile_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::PlayerProjectile, [] as [Layer; 0])
}

/// Live projectile of an untagged shooter: hits the world and both teams.
#[inline]
pub fn neutral_projectile_layers() -> CollisionLayers {
    CollisionLayers::new(
        Layer::NeutralProjectile,
        [Layer::World, Layer::Player, Layer::Enemy],
    )
}
