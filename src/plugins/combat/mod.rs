//! Combat plugin: team tags, health, and the damage message projectiles emit.
//!
//! A `Team` is the identity shooters and targets are compared by: a projectile
//! only damages bodies whose team differs from its shooter's.

use avian2d::prelude::*;
use bevy::ecs::message::MessageReader;
use bevy::prelude::*;

use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::plugins::projectiles::collision::process_projectile_collisions;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    Player,
    Enemy,
}

impl Team {
    pub fn opponent(self) -> Self {
        match self {
            Team::Player => Team::Enemy,
            Team::Enemy => Team::Player,
        }
    }

    pub fn body_layer(self) -> Layer {
        match self {
            Team::Player => Layer::Player,
            Team::Enemy => Layer::Enemy,
        }
    }

    pub fn projectile_layer(self) -> Layer {
        match self {
            Team::Player => Layer::PlayerProjectile,
            Team::Enemy => Layer::EnemyProjectile,
        }
    }

    /// Layers for a body of this team: hit by world, the opposing team's projectiles
    /// and projectiles of untagged shooters.
    pub fn body_layers(self) -> CollisionLayers {
        CollisionLayers::new(
            self.body_layer(),
            [
                Layer::World,
                self.opponent().body_layer(),
                self.opponent().projectile_layer(),
                Layer::NeutralProjectile,
            ],
        )
    }

    /// Layers for an active projectile fired by this team.
    ///
    /// Own-team bodies are filtered out here, so friendly contacts never reach
    /// the collision resolver in a real physics run.
    pub fn projectile_layers(self) -> CollisionLayers {
        CollisionLayers::new(
            self.projectile_layer(),
            [Layer::World, self.opponent().body_layer()],
        )
    }
}

#[derive(Component, Debug, Clone)]
pub struct Health {
    pub hp: i32,
}

/// A projectile hit: `amount` straight from the projectile's info, no modifiers applied.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageDealt {
    pub source: Entity,
    pub target: Entity,
    pub projectile: Entity,
    pub amount: i32,
}

pub fn plugin(app: &mut App) {
    app.add_message::<DamageDealt>();

    app.add_systems(
        FixedPostUpdate,
        apply_damage
            .after(process_projectile_collisions)
            .run_if(in_state(GameState::InGame)),
    );
}

pub fn apply_damage(mut hits: MessageReader<DamageDealt>, mut q_health: Query<&mut Health>) {
    for hit in hits.read() {
        let Ok(mut health) = q_health.get_mut(hit.target) else {
            continue;
        };

        health.hp -= hit.amount;
        debug!(
            "{:?} took {} damage from {:?} (hp {})",
            hit.target, hit.amount, hit.source, health.hp
        );
    }
}
