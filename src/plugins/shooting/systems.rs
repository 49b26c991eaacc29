use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;

use crate::common::clock::ShotClock;
use crate::plugins::projectiles::messages::SpawnProjectileRequest;

use super::library::ShotLibrary;
use super::messages::{ApplyShotPowerUp, ShootRequest, ShotPowerUpExpired, StopShootingRequest};
use super::shooter::{ShotContext, Shooter};

/// Producer side of the projectile pipeline.
///
/// Order within a frame: power-ups, stops, shoots, then every shooter's due tasks.
/// Applying a power-up before a shoot request lets the same frame fire its pattern.
pub fn drive_shooters(
    time: Res<Time<Virtual>>,
    library: Res<ShotLibrary>,
    mut power_ups: MessageReader<ApplyShotPowerUp>,
    mut stops: MessageReader<StopShootingRequest>,
    mut shoots: MessageReader<ShootRequest>,
    mut spawns: MessageWriter<SpawnProjectileRequest>,
    mut expired: MessageWriter<ShotPowerUpExpired>,
    mut q: Query<(Entity, &mut Shooter, &Transform)>,
) {
    let clock = ShotClock::from_virtual(&time);

    let mut flush = |ctx: ShotContext| {
        spawns.write_batch(ctx.spawns);
        expired.write_batch(ctx.expired);
    };

    for req in power_ups.read() {
        let Ok((_, mut shooter, _)) = q.get_mut(req.shooter) else {
            warn!("Power-up for unknown shooter {:?}", req.shooter);
            continue;
        };
        let Some(power_up) = library.power_up(req.power_up) else {
            warn!("Unknown power-up {:?}", req.power_up);
            continue;
        };

        shooter.add_power_up(req.power_up, power_up, &clock);
        info!("Power-up '{}' applied to {:?}", power_up.name, req.shooter);
    }

    for req in stops.read() {
        let Ok((_, mut shooter, _)) = q.get_mut(req.shooter) else {
            warn!("Stop request for unknown shooter {:?}", req.shooter);
            continue;
        };

        match req.pattern {
            None => shooter.stop_all(&library, &clock),
            Some(id) => {
                let Some(pattern) = library.pattern(id) else {
                    warn!("Stop request for unknown pattern {:?}", id);
                    continue;
                };
                shooter.stop_shooting(pattern, &clock);
            }
        }
    }

    for req in shoots.read() {
        let Ok((entity, mut shooter, tf)) = q.get_mut(req.shooter) else {
            warn!("Shoot request for unknown shooter {:?}", req.shooter);
            continue;
        };
        let Some(id) = req.pattern.or_else(|| shooter.current_pattern(&library)) else {
            debug!("{:?} has no pattern to shoot", entity);
            continue;
        };
        let Some(pattern) = library.pattern(id) else {
            warn!("Shoot request for unknown pattern {:?}", id);
            continue;
        };

        let mut ctx = ShotContext::new(entity, clock, tf);
        shooter.shoot(pattern, &mut ctx);
        flush(ctx);
    }

    if clock.paused {
        return;
    }

    for (entity, mut shooter, tf) in &mut q {
        if shooter.tasks().is_empty() {
            continue;
        }

        let mut ctx = ShotContext::new(entity, clock, tf);
        shooter.run_due_tasks(&library, &mut ctx);
        flush(ctx);
    }
}
