//! Per-tick projectile update: range check, sprite spin, behaviour movement.

use bevy::prelude::*;

use crate::common::clock::is_paused;

use super::behaviours::BehaviourManager;
use super::components::{PooledProjectile, Projectile};

pub fn advance_projectiles(
    time: Res<Time<Fixed>>,
    virtual_time: Option<Res<Time<Virtual>>>,
    mut q: Query<(&mut Projectile, &mut BehaviourManager, &mut Transform), With<PooledProjectile>>,
) {
    if virtual_time.is_some_and(|t| is_paused(&t)) {
        return;
    }

    let dt = time.delta_secs();

    for (mut projectile, mut manager, mut tf) in &mut q {
        if !projectile.is_shot() {
            continue;
        }
        projectile.tick(&mut manager, &mut tf, dt);
    }
}
