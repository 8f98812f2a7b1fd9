//! Projectiles plugin: **message-based producer → consumer** spawning + data-driven pooling.
//!
//! # Philosophy: invariants first
//! Correctness checks live at the boundaries (pattern validation when a
//! library loads, `shoot` when a spawner arms) so the hot paths (allocation,
//! probe, motion, return commit) stay straight-line.
//!
//! In an ECS, you can't make "this entity exists and has these components" a compile-time fact.
//! But you *can*:
//! - encode **meaning** with types (newtypes / enums),
//! - validate invariants once (spawn / state transition),
//! - and then treat violations as bugs (fail-fast `expect()`),
//! which removes a lot of runtime branching from hot loops.
//!
//! # Data flow (one tick, `Update`, chained)
//! ```text
//!┌────────────────────────────────────────────────────────────────────────────┐
//!│  (A) Producer: tick_pattern_spawners                                       │
//!│      - reads: PatternSpawner, TransformHelper, Time, PatternRng            │
//!│      - writes: SpawnProjectileRequest (one per projectile), PlaySound      │
//!│                                                                            │
//!│  (B) Consumer: allocate_projectiles_from_pool                              │
//!│      - mutates: ProjectilePool.free (pop, or grow)                         │
//!│      - stamps: Projectile, Motion, Lifetimes, Transform, visual child      │
//!│                                                                            │
//!│  (C) probe_projectile_hits        (SpatialQuery shape cast)                │
//!│      - writes: ProjectileHit                                               │
//!│                                                                            │
//!│  (D) resolve_projectile_hits                                               │
//!│      - mutates: Health, ProjectileState -> PendingReturn                   │
//!│      - writes: DamageTaken                                                 │
//!│                                                                            │
//!│  (E) advance_projectiles          (lifetime, reversal, idle, size, move)   │
//!│      - mutates: ProjectileState -> PendingReturn on expiry / out of bounds │
//!│                                                                            │
//!│  (F) clear_projectiles_on_request (ClearProjectiles)                       │
//!│                                                                            │
//!│  (G) Commit returns: return_to_pool_commit                                 │
//!│      - writes invariants for Inactive state, despawns visual child         │
//!│      - mutates: ProjectilePool.free.push(ProjectileEntity)                 │
//!└────────────────────────────────────────────────────────────────────────────┘
//!
//! Feedback loop:
//!   commit pushes ProjectileEntity back into ProjectilePool.free
//!   allocator pops ProjectileEntity from ProjectilePool.free
//! ```
//!
//! # Why "Messages" instead of direct pool access?
//! Spawners do **not** borrow `ResMut<ProjectilePool>`.
//! They only enqueue intent (SpawnProjectileRequest), so any number of
//! spawners can fire in the same tick while the allocator stays the
//! **single writer** of the free list.
//!
//! # Where do we still branch?
//! - Configuration: a spawner may refuse to arm (`SpawnerError`).
//! - Content: a silhouette pattern may have no bitmap yet (shot skipped).
//! Everything else is treated as an invariant violation.

pub mod components;
pub mod image;
pub mod pattern;
pub mod sampler;
pub mod spawner;
pub mod pool;
pub mod messages;
pub mod allocator;
pub mod collision;
pub mod motion;
pub mod commit;

use bevy::prelude::*;

use crate::common::sound::PlaySound;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;

/// The whole per-tick projectile pipeline.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectileSystems;

pub struct ProjectilesPlugin;

impl Plugin for ProjectilesPlugin {
    fn build(&self, app: &mut App) {
        let (prewarm, seed) = {
            let tunables = app.world().resource::<Tunables>();
            (tunables.pool_prewarm, tunables.rng_seed)
        };

        // A host app may supply its own library before adding the plugin.
        if !app.world().contains_resource::<pattern::PatternLibrary>() {
            app.insert_resource(pattern::PatternLibrary::builtin());
        }

        // Pool + pre-spawn
        app.insert_resource(pool::ProjectilePool::new(prewarm))
            .insert_resource(spawner::PatternRng::seeded(seed))
            .add_systems(Startup, pool::init_projectile_pool);

        app.add_message::<messages::SpawnProjectileRequest>()
            .add_message::<messages::ProjectileHit>()
            .add_message::<messages::ClearProjectiles>()
            .add_message::<PlaySound>();

        app.add_systems(
            Update,
            (
                spawner::tick_pattern_spawners,
                allocator::allocate_projectiles_from_pool,
                collision::probe_projectile_hits,
                collision::resolve_projectile_hits,
                motion::advance_projectiles,
                commit::clear_projectiles_on_request,
                commit::return_to_pool_commit,
            )
                .chain()
                .in_set(ProjectileSystems)
                .run_if(in_state(GameState::InGame)),
        );

        // Leaving the game retires everything in one pass.
        app.add_systems(
            OnExit(GameState::InGame),
            (commit::retire_all_projectiles, commit::return_to_pool_commit).chain(),
        );
    }
}

#[cfg(test)]
mod tests;
