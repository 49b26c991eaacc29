//! Demo plugin: a turret cycling through sample patterns at a target dummy,
//! inside a walled arena.
//!
//! Keys: `Space` applies the overdrive power-up and fires it, `S` stops the turret
//! (its chained patterns pick up again after their switch delay).

pub mod library;

use avian2d::prelude::*;
use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::plugins::combat::{Health, Team};
use crate::plugins::projectiles::messages::ProjectileFired;
use crate::plugins::shooting::library::ShotLibrary;
use crate::plugins::shooting::messages::{
    ApplyShotPowerUp, ShootRequest, ShotPowerUpExpired, StopShootingRequest,
};
use crate::plugins::shooting::shooter::Shooter;
use crate::plugins::shooting::systems::drive_shooters;

use self::library::DemoPatterns;

const HALF_W: f32 = 560.0;
const HALF_H: f32 = 340.0;

#[derive(Component)]
pub struct Turret;

#[derive(Component)]
pub struct Dummy;

/// Registers the sample patterns while building, so they exist before the initial
/// `OnEnter(InGame)` spawns the turret.
pub fn plugin(app: &mut App) {
    let patterns = {
        let mut lib = app.world_mut().get_resource_or_init::<ShotLibrary>();
        let patterns = library::build(&mut lib);
        let names: Vec<&str> = lib.patterns().map(|p| p.name.as_str()).collect();
        info!("Registered shot patterns: {}", names.join(", "));
        patterns
    };
    app.insert_resource(patterns);

    app.add_systems(OnEnter(GameState::InGame), (spawn_arena, spawn_actors))
        .add_systems(
            Update,
            (aim_turrets, fire_turrets, handle_keys)
                .chain()
                .before(drive_shooters)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            Update,
            log_shot_events
                .after(drive_shooters)
                .run_if(in_state(GameState::InGame)),
        );
}

fn spawn_arena(mut commands: Commands) {
    let color = Color::srgb(0.25, 0.27, 0.33);
    let thickness = 30.0;
    let layers = CollisionLayers::new(
        Layer::World,
        [
            Layer::Player,
            Layer::Enemy,
            Layer::PlayerProjectile,
            Layer::EnemyProjectile,
            Layer::NeutralProjectile,
        ],
    );

    let horizontal = Vec2::new(HALF_W * 2.0, thickness);
    let vertical = Vec2::new(thickness, HALF_H * 2.0);
    let edge_x = HALF_W + thickness * 0.5;
    let edge_y = HALF_H + thickness * 0.5;
    let walls = [
        ("WallTop", Vec2::new(0.0, edge_y), horizontal),
        ("WallBottom", Vec2::new(0.0, -edge_y), horizontal),
        ("WallLeft", Vec2::new(-edge_x, 0.0), vertical),
        ("WallRight", Vec2::new(edge_x, 0.0), vertical),
    ];

    for (name, pos, size) in walls {
        commands.spawn((
            Name::new(name),
            Sprite {
                color,
                custom_size: Some(size),
                ..default()
            },
            Transform::from_translation(pos.extend(0.0)),
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            layers,
            DespawnOnExit(GameState::InGame),
        ));
    }
}

/// Actors are unit-sized and scaled, so `scale.y` is their height (the shooter's
/// spawn offset reads it).
fn spawn_actors(mut commands: Commands, patterns: Res<DemoPatterns>) {
    let scale = Vec3::new(36.0, 36.0, 1.0);

    commands.spawn((
        Name::new("Turret"),
        Turret,
        Team::Enemy,
        Health { hp: 500 },
        Shooter::new(Some(patterns.spiral), 0.5),
        Sprite {
            color: Color::srgb(0.85, 0.3, 0.35),
            custom_size: Some(Vec2::ONE),
            ..default()
        },
        Transform::from_xyz(0.0, 180.0, 1.0).with_scale(scale),
        RigidBody::Static,
        Collider::rectangle(1.0, 1.0),
        Team::Enemy.body_layers(),
        DespawnOnExit(GameState::InGame),
    ));

    commands.spawn((
        Name::new("Dummy"),
        Dummy,
        Team::Player,
        Health { hp: 1000 },
        Sprite {
            color: Color::srgb(0.3, 0.8, 0.45),
            custom_size: Some(Vec2::ONE),
            ..default()
        },
        Transform::from_xyz(0.0, -220.0, 1.0).with_scale(scale),
        RigidBody::Static,
        Collider::rectangle(1.0, 1.0),
        Team::Player.body_layers(),
        DespawnOnExit(GameState::InGame),
    ));
}

fn aim_turrets(
    patterns: Res<DemoPatterns>,
    q_dummy: Query<&Transform, (With<Dummy>, Without<Turret>)>,
    mut q_turrets: Query<(&Transform, &mut Shooter), With<Turret>>,
) {
    let Some(dummy) = q_dummy.iter().next() else {
        return;
    };

    for (tf, mut shooter) in &mut q_turrets {
        let aim = dummy.translation.truncate() - tf.translation.truncate();
        for id in [patterns.spiral, patterns.fan, patterns.wave] {
            shooter.set_forced_target(id, Some(aim));
        }
    }
}

/// Idle turrets ask for their current pattern; the shooter's gates decide.
fn fire_turrets(
    q_turrets: Query<(Entity, &Shooter), With<Turret>>,
    mut shoot: MessageWriter<ShootRequest>,
) {
    for (entity, shooter) in &q_turrets {
        if !shooter.is_busy() {
            shoot.write(ShootRequest { shooter: entity, pattern: None });
        }
    }
}

fn handle_keys(
    keys: Res<ButtonInput<KeyCode>>,
    patterns: Res<DemoPatterns>,
    q_turrets: Query<Entity, With<Turret>>,
    mut power_ups: MessageWriter<ApplyShotPowerUp>,
    mut shoot: MessageWriter<ShootRequest>,
    mut stops: MessageWriter<StopShootingRequest>,
) {
    for shooter in &q_turrets {
        if keys.just_pressed(KeyCode::Space) {
            // Power-ups apply before shoot requests, so this fires the power-up's pattern.
            power_ups.write(ApplyShotPowerUp { shooter, power_up: patterns.overdrive });
            shoot.write(ShootRequest { shooter, pattern: None });
        }
        if keys.just_pressed(KeyCode::KeyS) {
            stops.write(StopShootingRequest { shooter, pattern: None });
        }
    }
}

fn log_shot_events(
    mut fired: MessageReader<ProjectileFired>,
    mut expired: MessageReader<ShotPowerUpExpired>,
) {
    for ev in fired.read() {
        if let Some(audio) = &ev.audio {
            debug!("{:?} fired {:?} (cue '{}')", ev.shooter, ev.projectile, audio);
        }
    }
    for ev in expired.read() {
        info!("{:?} lost power-up {:?}", ev.shooter, ev.power_up);
    }
}
