//! Projectiles plugin: **message-based producer → consumer** spawning over a fixed pool.
//!
//! # Philosophy: invariants first
//! Correctness checks live at the boundaries (allocation, contact resolution, return
//! commit) so the per-tick loop stays straight-line.
//!
//! # Data flow (big picture)
//! ```text
//!   Update schedule (variable dt)
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  (A) Producer: shooting::drive_shooters                                    │
//!│      - pattern steps write SpawnProjectileRequest messages                 │
//!│                                                                            │
//!│  (B) Consumer: allocate_projectiles_from_pool                              │
//!│      - pops ProjectilePool.free                                            │
//!│      - clone_from_template: sprite, hitbox, info, behaviour set            │
//!│      - Projectile::shoot, visibility + collision layers on                 │
//!│      - writes ProjectileFired (audio cue for the host)                     │
//!└────────────────────────────────────────────────────────────────────────────┘
//!                │
//!                v
//!   FixedUpdate / FixedPostUpdate (fixed dt)
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  (C) advance_projectiles: range check → sprite spin → behaviour movement   │
//!│                                                                            │
//!│  (D) Physics emits CollisionStart messages (Avian)                         │
//!│                                                                            │
//!│  (E) process_projectile_collisions                                         │
//!│      - Hit: DamageDealt, then pierce (ignore collider) or disable          │
//!│      - Friendly: nothing; Blocked: disable                                 │
//!│                                                                            │
//!│  (F) return_to_pool_commit: PendingReturn → Inactive, slot back to pool    │
//!└────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Where do we still branch?
//! - Capacity: pool can be empty → allocator drops the request.
//! - Contacts: team comparison decides hit / friendly / blocked.
//! Everything else is treated as an invariant violation.

pub mod behaviours;
pub mod components;
pub mod pool;
pub mod collision;
pub mod motion;

pub mod messages;
pub mod allocator;
pub mod commit;

use avian2d::collision::narrow_phase::CollisionEventSystems;
use bevy::prelude::*;

use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::shooting::systems::drive_shooters;

pub struct ProjectilesPlugin;

impl Plugin for ProjectilesPlugin {
    fn build(&self, app: &mut App) {
        let capacity = app
            .world()
            .get_resource::<Tunables>()
            .map_or(Tunables::default().projectile_pool_capacity, |t| t.projectile_pool_capacity);

        // Pool + pre-spawn
        app.insert_resource(pool::ProjectilePool::new(capacity))
            .add_systems(Startup, pool::init_projectile_pool);

        app.add_message::<messages::SpawnProjectileRequest>()
            .add_message::<messages::ProjectileFired>();

        app.add_systems(
            Update,
            allocator::allocate_projectiles_from_pool
                .after(drive_shooters)
                .run_if(in_state(GameState::InGame)),
        );

        app.add_systems(
            FixedUpdate,
            motion::advance_projectiles.run_if(in_state(GameState::InGame)),
        );

        // Fixed collision pipeline
        app.add_systems(
            FixedPostUpdate,
            collision::process_projectile_collisions
                .after(CollisionEventSystems)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedPostUpdate,
            commit::return_to_pool_commit
                .after(collision::process_projectile_collisions)
                .run_if(in_state(GameState::InGame)),
        );
    }
}
