//! Return commit: recycle projectiles back into the pool.
//!
//! This system is the "owner" of the *Inactive invariants*.
//!
//! Invariant: Inactive projectiles must be:
//! - hidden
//! - motionless (default `Motion`)
//! - without an attached visual
//!
//! Every retirement path (hit, lifetime, shrink, bounds, clear) only flips
//! the state to `PendingReturn`; the writes below happen nowhere else.

use bevy::ecs::message::MessageReader;
use bevy::prelude::*;

use super::components::{AttachedGraphic, Motion, PooledProjectile, ProjectileEntity, ProjectileState};
use super::messages::ClearProjectiles;
use super::pool::ProjectilePool;

pub fn return_to_pool_commit(
    mut commands: Commands,
    mut pool: ResMut<ProjectilePool>,
    mut q: Query<(
        Entity,
        &mut ProjectileState,
        &mut Visibility,
        &mut Motion,
        &mut AttachedGraphic,
    ), With<PooledProjectile>>,
) {
    for (e, mut state, mut vis, mut motion, mut graphic) in &mut q {
        if *state != ProjectileState::PendingReturn { continue; }

        *state = ProjectileState::Inactive;
        *vis = Visibility::Hidden;
        *motion = Motion::default();
        if let Some(child) = graphic.0.take()
            && let Ok(mut child) = commands.get_entity(child)
        {
            child.despawn();
        }

        pool.push_free(ProjectileEntity(e));
    }
}

/// Mark every active projectile for return.
pub fn retire_all_projectiles(mut q: Query<&mut ProjectileState, With<PooledProjectile>>) {
    for mut state in &mut q {
        if *state == ProjectileState::Active {
            *state = ProjectileState::PendingReturn;
        }
    }
}

pub fn clear_projectiles_on_request(
    mut reader: MessageReader<ClearProjectiles>,
    q: Query<&mut ProjectileState, With<PooledProjectile>>,
) {
    if reader.read().count() == 0 {
        return;
    }
    retire_all_projectiles(q);
}
