//! Return commit: recycle disabled projectiles back into the pool.
//!
//! This system is the "owner" of the *Inactive invariants*.
//!
//! Invariant: Inactive projectiles must be:
//! - hidden
//! - collide with nothing (filters empty)
//! - back in the free list exactly once

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::layers::inactive_projectile_layers;

use super::components::{PooledProjectile, Projectile, ProjectileState};
use super::pool::{ProjectilePool, ProjectileSlot};

pub fn return_to_pool_commit(
    mut pool: ResMut<ProjectilePool>,
    mut q: Query<(
        Entity,
        &mut Projectile,
        &mut Visibility,
        &mut CollisionLayers,
    ), With<PooledProjectile>>,
) {
    for (e, mut projectile, mut vis, mut layers) in &mut q {
        if projectile.state != ProjectileState::PendingReturn { continue; }

        projectile.state = ProjectileState::Inactive;
        *vis = Visibility::Hidden;
        *layers = inactive_projectile_layers();

        pool.push_free(ProjectileSlot(e));
    }
}
