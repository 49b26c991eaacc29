//! Spawn consumer: clone pattern templates into pooled slots and fire them.
//!
//! # Fail-fast invariants
//! - The pool free list contains only valid pooled projectile entities.
//! - Therefore, a pooled entity must match the projectile query.
//!
//! If this is violated, we `expect()` and crash loudly.

use avian2d::prelude::*;
use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;

use crate::common::layers::neutral_projectile_layers;
use crate::common::tunables::Tunables;
use crate::plugins::combat::Team;
use crate::plugins::shooting::library::ShotLibrary;

use super::behaviours::BehaviourManager;
use super::components::{PooledProjectile, Projectile, ProjectileHitbox};
use super::messages::{ProjectileFired, SpawnProjectileRequest};
use super::pool::ProjectilePool;

pub fn allocate_projectiles_from_pool(
    library: Res<ShotLibrary>,
    tunables: Option<Res<Tunables>>,
    mut pool: ResMut<ProjectilePool>,
    mut reader: MessageReader<SpawnProjectileRequest>,
    mut fired: MessageWriter<ProjectileFired>,
    q_teams: Query<&Team>,
    mut q: Query<(
        &mut Projectile,
        &mut BehaviourManager,
        &mut Transform,
        &mut Sprite,
        &mut ProjectileHitbox,
        &mut Collider,
        &mut CollisionLayers,
        &mut Visibility,
    ), With<PooledProjectile>>,
) {
    let z = tunables.map_or(Tunables::default().projectile_z, |t| t.projectile_z);

    for req in reader.read() {
        let Some(pattern) = library.pattern(req.pattern) else {
            warn!("Spawn request for unknown pattern {:?}", req.pattern);
            continue;
        };

        let Some(slot) = pool.pop_free() else {
            // Capacity decision, not a correctness failure.
            debug!("Projectile pool exhausted, dropping shot from {:?}", req.shooter);
            continue;
        };

        let (
            mut projectile,
            mut manager,
            mut tf,
            mut sprite,
            mut hitbox,
            mut collider,
            mut layers,
            mut vis,
        ) = q
            .get_mut(slot.0)
            .expect("ProjectilePool contained an entity missing pooled projectile components");

        tf.translation = req.position.extend(z);
        tf.rotation = req.rotation;

        projectile.clone_from_template(
            &mut manager,
            &pattern.projectile,
            pattern.info.clone(),
            &pattern.behaviours,
        );
        pattern.projectile.apply_shape(&mut sprite, &mut hitbox, &mut collider);

        let team = q_teams.get(req.shooter).ok().copied();
        if !projectile.shoot(&mut manager, &mut tf, req.shooter, team, req.target, req.direction) {
            pool.push_free(slot);
            continue;
        }

        *vis = Visibility::Visible;
        *layers = team.map_or_else(neutral_projectile_layers, Team::projectile_layers);

        fired.write(ProjectileFired {
            projectile: slot.0,
            shooter: req.shooter,
            audio: pattern.info.fire_audio.clone(),
        });
    }
}
