use std::sync::Arc;

use bevy::ecs::message::Messages;
use bevy::prelude::*;

use crate::common::clock::ShotClock;
use crate::common::test_utils::run_system_once;
use crate::plugins::projectiles::components::{ProjectileHitbox, ProjectileInfo, ProjectileTemplate};
use crate::plugins::projectiles::messages::SpawnProjectileRequest;

use super::library::{PatternId, ShotLibrary, ShotPatternPowerUp};
use super::messages::{ApplyShotPowerUp, ShootRequest, ShotPowerUpExpired, StopShootingRequest};
use super::pattern::{PatternKind, ShotPattern};
use super::shooter::{ShotContext, Shooter, TaskKind};
use super::systems::drive_shooters;

fn template() -> Arc<ProjectileTemplate> {
    Arc::new(ProjectileTemplate::new("orb", Sprite::default(), ProjectileHitbox::default()))
}

fn pattern(name: &str, kind: PatternKind) -> ShotPattern {
    ShotPattern::new(name, kind, template(), Arc::new(ProjectileInfo::default()))
}

fn aimed(name: &str) -> ShotPattern {
    pattern(name, PatternKind::Aimed)
}

fn shot_ctx(now_ms: f64) -> ShotContext {
    ShotContext::new(Entity::PLACEHOLDER, ShotClock::new(now_ms), &Transform::default())
}

/// One frame of task processing; returns the number of spawn requests.
fn frame(shooter: &mut Shooter, library: &ShotLibrary, now_ms: f64) -> usize {
    let mut ctx = shot_ctx(now_ms);
    shooter.run_due_tasks(library, &mut ctx);
    ctx.spawns.len()
}

/// Frames every 10 ms in `(from, to]`; returns the timestamps that spawned something.
fn run_frames(shooter: &mut Shooter, library: &ShotLibrary, from: f64, to: f64) -> Vec<f64> {
    let mut fired = Vec::new();
    let mut now = from + 10.0;
    while now <= to {
        if frame(shooter, library, now) > 0 {
            fired.push(now);
        }
        now += 10.0;
    }
    fired
}

fn shoot(shooter: &mut Shooter, library: &ShotLibrary, id: PatternId, now_ms: f64) -> (bool, usize) {
    let mut ctx = shot_ctx(now_ms);
    let started = shooter.shoot(library.pattern(id).unwrap(), &mut ctx);
    (started, ctx.spawns.len())
}

// -----------------------------------------------------------------------------
// Looping rules
// -----------------------------------------------------------------------------

#[test]
fn non_looping_pattern_is_done_after_first_loop() {
    let mut library = ShotLibrary::default();
    let id = library.add_pattern(aimed("single"));
    let pattern = library.pattern(id).unwrap();
    let mut shooter = Shooter::default();

    assert!(!pattern.is_done_looping(&shooter));
    shooter.record_mut(id).loops = 1;
    assert!(pattern.is_done_looping(&shooter));
}

#[test]
fn three_shots_fire_a_tenth_of_a_second_apart_then_stop() {
    let mut library = ShotLibrary::default();
    let id = library.add_pattern(aimed("burst").with_shots(3).with_step_delay(0.1));
    let mut shooter = Shooter::default();

    let (started, spawned) = shoot(&mut shooter, &library, id, 0.0);
    assert!(started);
    assert_eq!(spawned, 1, "first step runs immediately");

    let fired = run_frames(&mut shooter, &library, 0.0, 250.0);
    assert_eq!(fired.len(), 2);
    assert!(fired[0] >= 100.0 && fired[1] - fired[0] >= 100.0);
    assert!(shooter.is_active(id));

    let fired = run_frames(&mut shooter, &library, 250.0, 500.0);
    assert!(fired.is_empty());
    assert!(!shooter.is_active(id));
    assert!(shooter.tasks().is_empty());
    assert_eq!(shooter.record(id).unwrap().loops, 1);
}

#[test]
fn looping_pattern_takes_loops_times_shots_steps() {
    let mut library = ShotLibrary::default();
    let id = library.add_pattern(aimed("looped").with_shots(2).with_looping(3).with_step_delay(0.1));
    let mut shooter = Shooter::default();

    let (_, first) = shoot(&mut shooter, &library, id, 0.0);
    let rest = run_frames(&mut shooter, &library, 0.0, 2000.0);

    assert_eq!(first + rest.len(), 6);
    assert!(!shooter.is_active(id));
}

#[test]
fn zero_loops_before_switch_never_finishes() {
    let mut library = ShotLibrary::default();
    let id = library.add_pattern(aimed("forever").with_looping(0).with_step_delay(0.1));
    let mut shooter = Shooter::default();

    shoot(&mut shooter, &library, id, 0.0);
    run_frames(&mut shooter, &library, 0.0, 5000.0);

    assert!(shooter.is_active(id));
    assert!(shooter.record(id).unwrap().loops > 10);
}

#[test]
fn pattern_cooldown_separates_loops() {
    let mut library = ShotLibrary::default();
    let id = library.add_pattern(aimed("pulsed").with_looping(2).with_pattern_cooldown(0.5));
    let mut shooter = Shooter::default();

    shoot(&mut shooter, &library, id, 0.0);
    let fired = run_frames(&mut shooter, &library, 0.0, 2000.0);

    assert_eq!(fired.len(), 1);
    assert!(fired[0] >= 500.0);
    assert!(!shooter.is_active(id));
}

#[test]
fn instant_pattern_fires_whole_loop_at_once() {
    let mut library = ShotLibrary::default();
    let id = library.add_pattern(
        aimed("volley")
            .with_shots(4)
            .with_instant(true)
            .with_looping(0)
            .with_pattern_cooldown(0.5),
    );
    let mut shooter = Shooter::default();

    let (_, spawned) = shoot(&mut shooter, &library, id, 0.0);
    assert_eq!(spawned, 4);
    assert_eq!(shooter.record(id).unwrap().loops, 1);

    assert_eq!(frame(&mut shooter, &library, 250.0), 0);
    assert_eq!(frame(&mut shooter, &library, 510.0), 4);
}

// -----------------------------------------------------------------------------
// Transitions & cancellation
// -----------------------------------------------------------------------------

#[test]
fn finished_pattern_transitions_after_switch_delay() {
    let mut library = ShotLibrary::default();
    let next = library.add_pattern(aimed("next"));
    let first = library.add_pattern(aimed("first").with_next(next).with_switch_delay(0.5));
    let mut shooter = Shooter::default();

    shoot(&mut shooter, &library, first, 0.0);

    // Zero step delay: the closing step runs on the following frame.
    frame(&mut shooter, &library, 10.0);
    assert!(!shooter.is_active(first));
    assert!(shooter
        .tasks()
        .iter()
        .any(|t| t.kind == TaskKind::Transition { pattern: first }));

    assert_eq!(frame(&mut shooter, &library, 500.0), 0);
    assert!(!shooter.is_active(next));

    let mut ctx = shot_ctx(520.0);
    shooter.run_due_tasks(&library, &mut ctx);
    assert!(shooter.is_active(next));
    assert_eq!(ctx.spawns.len(), 1);
    assert_eq!(ctx.spawns[0].pattern, next);
}

#[test]
fn link_rejects_unknown_patterns() {
    let mut library = ShotLibrary::default();
    let a = library.add_pattern(aimed("a"));
    let b = library.add_pattern(aimed("b"));

    assert!(library.link(a, b));
    assert!(library.link(b, a), "cycles are allowed");
    assert!(!library.link(a, PatternId::UNREGISTERED));
    assert_eq!(library.pattern(a).unwrap().next_patterns, vec![b]);
}

#[test]
fn stale_step_from_previous_run_is_dropped() {
    let mut library = ShotLibrary::default();
    let id = library.add_pattern(aimed("burst").with_shots(3).with_step_delay(0.1));
    let mut shooter = Shooter::default();

    shoot(&mut shooter, &library, id, 0.0);
    shooter.stop_shooting(library.pattern(id).unwrap(), &ShotClock::new(50.0));
    let (restarted, _) = shoot(&mut shooter, &library, id, 60.0);
    assert!(restarted);

    // The first run's task was due at 100 and must not step the second run.
    assert_eq!(frame(&mut shooter, &library, 110.0), 0);
    assert_eq!(frame(&mut shooter, &library, 170.0), 1);
    assert_eq!(shooter.record(id).unwrap().shots_fired, 2);
}

#[test]
fn stop_all_stops_every_tracked_pattern() {
    let mut library = ShotLibrary::default();
    let follow = library.add_pattern(aimed("follow"));
    let running = library.add_pattern(
        aimed("running").with_looping(0).with_step_delay(0.1).with_next(follow),
    );
    let done = library.add_pattern(aimed("done").with_next(follow));
    let mut shooter = Shooter::default();

    // `done` closes on the next frame, transitions into `follow`, which closes too.
    shoot(&mut shooter, &library, done, 0.0);
    frame(&mut shooter, &library, 10.0);
    frame(&mut shooter, &library, 20.0);
    frame(&mut shooter, &library, 30.0);
    assert!(!shooter.is_active(done));
    assert!(!shooter.is_active(follow));
    assert!(shooter.tasks().is_empty());

    shoot(&mut shooter, &library, running, 1000.0);
    shooter.stop_all(&library, &ShotClock::new(1050.0));

    assert!(!shooter.is_active(running));
    let mut transitions: Vec<PatternId> = shooter
        .tasks()
        .iter()
        .filter_map(|t| match t.kind {
            TaskKind::Transition { pattern } => Some(pattern),
            _ => None,
        })
        .collect();
    transitions.sort();
    let mut expected = vec![running, done];
    expected.sort();
    assert_eq!(transitions, expected);
}

#[test]
fn shooter_stays_busy_through_a_pending_transition() {
    let mut library = ShotLibrary::default();
    let next = library.add_pattern(aimed("next"));
    let first = library.add_pattern(aimed("first").with_next(next).with_switch_delay(0.5));
    let mut shooter = Shooter::default();
    assert!(!shooter.is_busy());

    shoot(&mut shooter, &library, first, 0.0);
    frame(&mut shooter, &library, 10.0);
    assert!(!shooter.is_active(first));
    assert!(shooter.is_busy());

    frame(&mut shooter, &library, 520.0);
    frame(&mut shooter, &library, 530.0);
    assert!(!shooter.is_busy());
}

// -----------------------------------------------------------------------------
// Gates
// -----------------------------------------------------------------------------

#[test]
fn cannot_shoot_a_pattern_that_is_running() {
    let mut library = ShotLibrary::default();
    let id = library.add_pattern(aimed("forever").with_looping(0).with_step_delay(0.1));
    let mut shooter = Shooter::default();

    assert!(shoot(&mut shooter, &library, id, 0.0).0);
    assert!(!shooter.can_shoot(library.pattern(id).unwrap(), &ShotClock::new(5000.0)));
    assert_eq!(shoot(&mut shooter, &library, id, 5000.0), (false, 0));
}

#[test]
fn shooter_cooldown_blocks_restart_unless_bypassed() {
    let mut library = ShotLibrary::default();
    let plain = library.add_pattern(aimed("plain"));
    let bypass = library.add_pattern(aimed("bypass").with_bypass_shooter_cooldown(true));
    let mut shooter = Shooter::new(Some(plain), 1.0);

    shoot(&mut shooter, &library, plain, 0.0);
    frame(&mut shooter, &library, 10.0);
    assert!(!shooter.is_active(plain));

    let plain_pattern = library.pattern(plain).unwrap();
    assert!(!shooter.can_shoot(plain_pattern, &ShotClock::new(500.0)));
    assert!(shooter.can_shoot(library.pattern(bypass).unwrap(), &ShotClock::new(500.0)));
    assert!(shooter.can_shoot(plain_pattern, &ShotClock::new(1000.0)));
}

#[test]
fn paused_clock_blocks_shots_and_tasks() {
    let mut library = ShotLibrary::default();
    let id = library.add_pattern(aimed("burst").with_shots(3).with_step_delay(0.1));
    let mut shooter = Shooter::default();

    let paused = ShotClock { now_ms: 0.0, paused: true };
    assert!(!shooter.can_shoot(library.pattern(id).unwrap(), &paused));

    shoot(&mut shooter, &library, id, 0.0);
    let mut ctx = ShotContext::new(Entity::PLACEHOLDER, ShotClock { now_ms: 500.0, paused: true }, &Transform::default());
    shooter.run_due_tasks(&library, &mut ctx);

    assert!(ctx.spawns.is_empty());
    assert_eq!(shooter.record(id).unwrap().shots_fired, 1);
}

// -----------------------------------------------------------------------------
// Power-ups
// -----------------------------------------------------------------------------

#[test]
fn reapplied_power_up_refreshes_and_moves_to_most_recent() {
    let mut library = ShotLibrary::default();
    let base = library.add_pattern(aimed("base"));
    let x = library.add_pattern(aimed("x"));
    let y = library.add_pattern(aimed("y"));
    let px = library.add_power_up(ShotPatternPowerUp::new("px", x, 1.0));
    let py = library.add_power_up(ShotPatternPowerUp::new("py", y, 1.0));
    let mut shooter = Shooter::new(Some(base), 0.0);

    assert_eq!(shooter.current_pattern(&library), Some(base));

    shooter.add_power_up(px, library.power_up(px).unwrap(), &ShotClock::new(0.0));
    shooter.add_power_up(py, library.power_up(py).unwrap(), &ShotClock::new(100.0));
    assert_eq!(shooter.current_pattern(&library), Some(y));

    shooter.add_power_up(px, library.power_up(px).unwrap(), &ShotClock::new(200.0));

    let active = shooter.power_ups();
    assert_eq!(active.len(), 2);
    assert_eq!(active[1].power_up, px);
    assert_eq!(active[1].activated_ms, 200.0);
    assert_eq!(shooter.current_pattern(&library), Some(x));

    let expiries = shooter
        .tasks()
        .iter()
        .filter(|t| matches!(t.kind, TaskKind::PowerUpExpiry { .. }))
        .count();
    assert_eq!(expiries, 2);
}

#[test]
fn refreshed_power_up_expires_at_its_new_deadline() {
    let mut library = ShotLibrary::default();
    let base = library.add_pattern(aimed("base"));
    let boosted = library.add_pattern(aimed("boosted"));
    let boost = library.add_power_up(ShotPatternPowerUp::new("boost", boosted, 1.0));
    let mut shooter = Shooter::new(Some(base), 0.0);

    shooter.add_power_up(boost, library.power_up(boost).unwrap(), &ShotClock::new(0.0));
    shooter.add_power_up(boost, library.power_up(boost).unwrap(), &ShotClock::new(500.0));

    let mut ctx = shot_ctx(1000.0);
    shooter.run_due_tasks(&library, &mut ctx);
    assert_eq!(shooter.current_pattern(&library), Some(boosted));
    assert!(ctx.expired.is_empty());
    assert_eq!(shooter.tasks()[0].due_ms, 1500.0);

    let mut ctx = shot_ctx(1500.0);
    shooter.run_due_tasks(&library, &mut ctx);
    assert_eq!(shooter.current_pattern(&library), Some(base));
    assert_eq!(ctx.expired.len(), 1);
    assert_eq!(ctx.expired[0].power_up, boost);
}

#[test]
fn expired_power_up_stops_its_pattern() {
    let mut library = ShotLibrary::default();
    let boosted = library.add_pattern(aimed("boosted").with_looping(0).with_step_delay(0.1));
    let boost = library.add_power_up(ShotPatternPowerUp::new("boost", boosted, 1.0));
    let mut shooter = Shooter::default();

    shooter.add_power_up(boost, library.power_up(boost).unwrap(), &ShotClock::new(0.0));
    let id = shooter.current_pattern(&library).unwrap();
    shoot(&mut shooter, &library, id, 0.0);

    run_frames(&mut shooter, &library, 0.0, 990.0);
    assert!(shooter.is_active(boosted));

    run_frames(&mut shooter, &library, 990.0, 1200.0);
    assert!(!shooter.is_active(boosted));
    assert!(shooter.power_ups().is_empty());
}

// -----------------------------------------------------------------------------
// Geometry
// -----------------------------------------------------------------------------

#[test]
fn spread_fans_around_the_aim_vector() {
    let mut library = ShotLibrary::default();
    let id = library.add_pattern(pattern("fan", PatternKind::Spread { count: 3, arc_degrees: 90.0 }));
    let mut shooter = Shooter::default();

    let mut ctx = shot_ctx(0.0);
    shooter.shoot(library.pattern(id).unwrap(), &mut ctx);

    let dirs: Vec<Vec2> = ctx.spawns.iter().map(|s| s.direction).collect();
    assert_eq!(dirs.len(), 3);
    assert!(dirs[1].abs_diff_eq(Vec2::Y, 1e-5));
    assert!(dirs[0].abs_diff_eq(Vec2::new(1.0, 1.0).normalize(), 1e-5));
    assert!(dirs[2].abs_diff_eq(Vec2::new(-1.0, 1.0).normalize(), 1e-5));
}

#[test]
fn ring_spirals_by_spin_per_step_and_resets_on_init() {
    let mut library = ShotLibrary::default();
    let id = library.add_pattern(
        pattern("spiral", PatternKind::Ring { count: 4, spin_per_step: 15.0 })
            .with_shots(2)
            .with_looping(0)
            .with_step_delay(0.1),
    );
    let mut shooter = Shooter::default();

    let mut ctx = shot_ctx(0.0);
    shooter.shoot(library.pattern(id).unwrap(), &mut ctx);
    assert_eq!(ctx.spawns.len(), 4);
    assert!(ctx.spawns[1].direction.abs_diff_eq(Vec2::NEG_X, 1e-5));
    assert_eq!(shooter.record(id).unwrap().angle, 15.0);

    library.pattern(id).unwrap().init(&mut shooter);
    assert_eq!(shooter.record(id).unwrap().angle, 0.0);
}

#[test]
fn spawn_position_honours_override_and_flip() {
    let mut library = ShotLibrary::default();
    let up = library.add_pattern(aimed("up"));
    let down = library.add_pattern(aimed("down").with_flipped_origin(true));
    let mut shooter = Shooter::default();

    let tf = Transform::from_xyz(10.0, 20.0, 0.0).with_scale(Vec3::new(1.0, 4.0, 1.0));
    let ctx = ShotContext::new(Entity::PLACEHOLDER, ShotClock::new(0.0), &tf);

    assert_eq!(library.pattern(up).unwrap().spawn_position(&shooter, &ctx), Vec2::new(10.0, 22.0));
    assert_eq!(library.pattern(down).unwrap().spawn_position(&shooter, &ctx), Vec2::new(10.0, 18.0));

    shooter.set_spawn_location(up, Some(Vec2::new(-5.0, 0.0)));
    assert_eq!(library.pattern(up).unwrap().spawn_position(&shooter, &ctx), Vec2::new(-5.0, 2.0));
}

#[test]
fn forced_target_overrides_template_up_unless_zero() {
    let mut library = ShotLibrary::default();
    let id = library.add_pattern(aimed("aimed"));
    let pattern = library.pattern(id).unwrap();
    let mut shooter = Shooter::default();

    assert_eq!(pattern.fetch_target(&shooter), Vec2::Y);

    shooter.set_forced_target(id, Some(Vec2::new(3.0, 0.0)));
    assert_eq!(pattern.fetch_target(&shooter), Vec2::new(3.0, 0.0));

    let mut ctx = shot_ctx(0.0);
    shooter.shoot(pattern, &mut ctx);
    assert!(ctx.spawns[0].direction.abs_diff_eq(Vec2::X, 1e-6));

    shooter.set_forced_target(id, Some(Vec2::ZERO));
    assert_eq!(pattern.fetch_target(&shooter), Vec2::Y);
}

// -----------------------------------------------------------------------------
// System
// -----------------------------------------------------------------------------

fn system_world() -> World {
    let mut world = World::new();
    world.insert_resource(Time::<Virtual>::default());
    world.init_resource::<ShotLibrary>();
    world.init_resource::<Messages<ShootRequest>>();
    world.init_resource::<Messages<StopShootingRequest>>();
    world.init_resource::<Messages<ApplyShotPowerUp>>();
    world.init_resource::<Messages<ShotPowerUpExpired>>();
    world.init_resource::<Messages<SpawnProjectileRequest>>();
    world
}

#[test]
fn shoot_request_uses_current_pattern_and_writes_spawns() {
    let mut world = system_world();
    let (base, boost) = {
        let mut library = world.resource_mut::<ShotLibrary>();
        let base = library.add_pattern(aimed("base"));
        let boosted = library.add_pattern(pattern("fan", PatternKind::Spread { count: 5, arc_degrees: 60.0 }));
        let boost = library.add_power_up(ShotPatternPowerUp::new("boost", boosted, 5.0));
        (base, boost)
    };
    let shooter = world
        .spawn((Shooter::new(Some(base), 0.0), Transform::default()))
        .id();

    world.write_message(ApplyShotPowerUp { shooter, power_up: boost });
    world.write_message(ShootRequest { shooter, pattern: None });
    run_system_once(&mut world, drive_shooters);

    let spawns = world.resource::<Messages<SpawnProjectileRequest>>();
    assert_eq!(spawns.len(), 5);
    assert!(spawns.iter_current_update_messages().all(|s| s.shooter == shooter));
}

#[test]
fn stop_request_without_pattern_stops_everything() {
    let mut world = system_world();
    let id = world
        .resource_mut::<ShotLibrary>()
        .add_pattern(aimed("forever").with_looping(0).with_step_delay(0.1));
    let shooter = world.spawn((Shooter::default(), Transform::default())).id();

    world.write_message(ShootRequest { shooter, pattern: Some(id) });
    run_system_once(&mut world, drive_shooters);
    assert!(world.get::<Shooter>(shooter).unwrap().is_active(id));

    world.write_message(StopShootingRequest { shooter, pattern: None });
    run_system_once(&mut world, drive_shooters);
    assert!(!world.get::<Shooter>(shooter).unwrap().is_active(id));
}

#[test]
fn requests_for_unknown_shooters_are_ignored() {
    let mut world = system_world();
    let id = world.resource_mut::<ShotLibrary>().add_pattern(aimed("a"));
    let ghost = world.spawn_empty().id();

    world.write_message(ShootRequest { shooter: ghost, pattern: Some(id) });
    run_system_once(&mut world, drive_shooters);

    assert_eq!(world.resource::<Messages<SpawnProjectileRequest>>().len(), 0);
}
