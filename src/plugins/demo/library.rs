//! Sample patterns for the demo turret.
//!
//! ```text
//!  spiral (2 loops) ──0.6s──► fan (3 volleys) ──0.6s──► spiral …
//!  overdrive power-up: wave volley, forever, for 4 seconds
//! ```

use std::sync::Arc;

use bevy::prelude::*;

use crate::plugins::projectiles::behaviours::{
    AcceleratingMovement, LinearMovement, ProjectileBehaviour, SpinMovement, WaveMovement,
};
use crate::plugins::projectiles::components::{ProjectileHitbox, ProjectileInfo, ProjectileTemplate};
use crate::plugins::shooting::library::{PatternId, PowerUpId, ShotLibrary, ShotPatternPowerUp};
use crate::plugins::shooting::pattern::{PatternKind, ShotPattern};

#[derive(Resource, Debug, Clone, Copy)]
pub struct DemoPatterns {
    pub spiral: PatternId,
    pub fan: PatternId,
    pub wave: PatternId,
    pub overdrive: PowerUpId,
}

fn template(name: &str, color: Color, size: Vec2) -> Arc<ProjectileTemplate> {
    let sprite = Sprite {
        color,
        custom_size: Some(size),
        ..default()
    };
    Arc::new(ProjectileTemplate::new(
        name,
        sprite,
        ProjectileHitbox { size, offset: Vec2::ZERO },
    ))
}

fn behaviour(b: impl ProjectileBehaviour) -> Arc<dyn ProjectileBehaviour> {
    Arc::new(b)
}

pub fn build(library: &mut ShotLibrary) -> DemoPatterns {
    let orb = template("orb", Color::srgb(1.0, 0.45, 0.3), Vec2::splat(10.0));
    let needle = template("needle", Color::srgb(0.4, 0.8, 1.0), Vec2::new(4.0, 14.0));

    let spiral_info = Arc::new(ProjectileInfo {
        range: 900.0,
        behaviours: vec![behaviour(LinearMovement { speed: 160.0 })],
        fire_audio: Some("shot_soft".into()),
        ..default()
    });
    let spiral = library.add_pattern(
        ShotPattern::new(
            "spiral",
            PatternKind::Ring { count: 6, spin_per_step: 11.0 },
            orb.clone(),
            spiral_info,
        )
            .with_shots(24)
            .with_step_delay(0.08)
            .with_looping(2)
            .with_pattern_cooldown(0.3)
            .with_flipped_origin(true)
            .with_switch_delay(0.6),
    );

    let fan_info = Arc::new(ProjectileInfo {
        range: 1100.0,
        face_at_target: true,
        sprite_rotation: -90.0,
        behaviours: vec![behaviour(AcceleratingMovement {
            initial_speed: 60.0,
            acceleration: 400.0,
            max_speed: 420.0,
        })],
        fire_audio: Some("shot_sharp".into()),
        ..default()
    });
    let fan = library.add_pattern(
        ShotPattern::new(
            "fan",
            PatternKind::Spread { count: 7, arc_degrees: 70.0 },
            needle,
            fan_info,
        )
            .with_shots(3)
            .with_step_delay(0.25)
            .with_flipped_origin(true)
            .with_next(spiral)
            .with_switch_delay(0.6),
    );
    library.link(spiral, fan);

    let wave_info = Arc::new(ProjectileInfo {
        range: 1000.0,
        piercing: true,
        rotate: true,
        rotation_speed: 360.0,
        damage: 2,
        behaviours: vec![behaviour(WaveMovement { speed: 240.0, amplitude: 18.0, frequency: 2.0 })],
        ..default()
    });
    let wave = library.add_pattern(
        ShotPattern::new(
            "wave",
            PatternKind::Spread { count: 5, arc_degrees: 40.0 },
            orb,
            wave_info,
        )
            .with_instant(true)
            .with_looping(0)
            .with_pattern_cooldown(0.4)
            .with_bypass_shooter_cooldown(true)
            .with_flipped_origin(true)
            .with_behaviour(behaviour(SpinMovement { degrees_per_second: 25.0 })),
    );
    let overdrive = library.add_power_up(ShotPatternPowerUp::new("overdrive", wave, 4.0));

    DemoPatterns { spiral, fan, wave, overdrive }
}
