use avian2d::prelude::*;
use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;

use crate::plugins::combat::{DamageDealt, Team};
use crate::plugins::shooting::shooter::Shooter;

use super::behaviours::BehaviourManager;
use super::components::{PooledProjectile, Projectile};

#[derive(Clone, Copy, Debug)]
struct CollisionTarget {
    collider: Entity,
    body: Option<Entity>,
}

impl CollisionTarget {
    #[inline]
    fn gameplay_owner(self) -> Entity {
        self.body.unwrap_or(self.collider)
    }
}

#[inline]
fn targets(ev: &CollisionStart) -> (CollisionTarget, CollisionTarget) {
    (
        CollisionTarget {
            collider: ev.collider1,
            body: ev.body1,
        },
        CollisionTarget {
            collider: ev.collider2,
            body: ev.body2,
        },
    )
}

/// What a contact means for the projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactOutcome {
    /// Own team. Layers filter these in a physics run; nothing happens.
    Friendly,
    /// Different team: damage, then pierce or disable.
    Hit,
    /// Walls, untagged bodies, or a projectile whose shooter is gone: disable.
    Blocked,
}

pub fn classify_contact(projectile: &Projectile, other_team: Option<Team>) -> ContactOutcome {
    match (projectile.shooter, other_team) {
        (_, Some(team)) if projectile.shooter_team == Some(team) => ContactOutcome::Friendly,
        (Some(_), Some(_)) => ContactOutcome::Hit,
        _ => ContactOutcome::Blocked,
    }
}

pub fn process_projectile_collisions(
    mut started: MessageReader<CollisionStart>,
    q_is_projectile: Query<(), With<PooledProjectile>>,
    mut q_projectiles: Query<
        (Entity, &mut Projectile, &mut BehaviourManager, &mut Transform),
        With<PooledProjectile>,
    >,
    q_teams: Query<&Team>,
    mut damage: MessageWriter<DamageDealt>,
) {
    for ev in started.read() {
        let (t1, t2) = targets(ev);

        let p1 = q_is_projectile.contains(t1.collider);
        let p2 = q_is_projectile.contains(t2.collider);
        if !(p1 ^ p2) {
            continue; // must be exactly one projectile
        }
        let (projectile_side, other_side) = if p1 { (t1, t2) } else { (t2, t1) };

        let Ok((entity, mut projectile, mut manager, mut tf)) =
            q_projectiles.get_mut(projectile_side.collider)
        else {
            continue;
        };

        if !projectile.is_shot() {
            continue;
        }

        let owner = other_side.gameplay_owner();
        if projectile.ignores(other_side.collider) || projectile.ignores(owner) {
            continue;
        }

        let Some(info) = projectile.info.clone() else {
            continue;
        };

        match classify_contact(&projectile, q_teams.get(owner).ok().copied()) {
            ContactOutcome::Friendly => {}
            ContactOutcome::Hit => {
                if let Some(shooter) = projectile.shooter {
                    damage.write(Shooter::damage(shooter, entity, &info, owner));
                }
                if info.piercing {
                    projectile.ignore(other_side.collider);
                } else {
                    projectile.disable(&mut manager, &mut tf, true);
                }
            }
            ContactOutcome::Blocked => projectile.disable(&mut manager, &mut tf, true),
        }
    }
}
