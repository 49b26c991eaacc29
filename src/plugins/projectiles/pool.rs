use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::layers::inactive_projectile_layers;

use super::behaviours::BehaviourManager;
use super::components::{PooledProjectile, Projectile, ProjectileHitbox};

/// Index-based handle to one pre-spawned projectile slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProjectileSlot(pub Entity);

#[derive(Resource, Debug)]
pub struct ProjectilePool {
    pub free: Vec<ProjectileSlot>,
    pub capacity: usize,
}

impl ProjectilePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn pop_free(&mut self) -> Option<ProjectileSlot> {
        self.free.pop()
    }

    #[inline]
    pub fn push_free(&mut self, slot: ProjectileSlot) {
        debug_assert!(!self.free.contains(&slot), "projectile slot returned to the pool twice");
        self.free.push(slot);
    }
}

/// Pre-spawn pooled projectiles (inactive).
///
/// Physics components stay present for the slot's whole life; inactive slots
/// carry empty collision filters so they never produce contact events.
///
/// Slots are dynamic sensors with zero velocity: behaviours move them through
/// `Transform`, physics only reports contacts.
pub fn init_projectile_pool(mut commands: Commands, mut pool: ResMut<ProjectilePool>) {
    pool.free.clear();
    let cap = pool.capacity;
    pool.free.reserve(cap);

    let hitbox = ProjectileHitbox::default();

    for _ in 0..cap {
        let e = commands
            .spawn((
                Name::new("Projectile(Pooled)"),
                PooledProjectile,
                Projectile::default(),
                BehaviourManager::default(),
                Sprite {
                    color: Color::srgb(1.0, 0.85, 0.3),
                    custom_size: Some(hitbox.size),
                    ..default()
                },
                hitbox,
                Transform::default(),
                Visibility::Hidden,
                RigidBody::Dynamic,
                hitbox.collider(),
                Sensor,
                LinearVelocity(Vec2::ZERO),
                inactive_projectile_layers(),
                CollisionEventsEnabled,
            ))
            .id();

        pool.free.push(ProjectileSlot(e));
    }
}
