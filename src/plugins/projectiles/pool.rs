//! Projectile pool.
//!
//! The pool only tracks *which* pooled entities are free; component values
//! live on the entities. Growth never fails: when the free list is empty the
//! allocator spawns a new pooled entity and registers it here, so a pool that
//! is pre-warmed too small degrades to allocate-on-demand instead of dropping
//! shots. The pool never shrinks.

use bevy::prelude::*;

use super::components::{
    AttachedGraphic, Lifetimes, Motion, PooledProjectile, Projectile, ProjectileEntity, ProjectileState,
};

#[derive(Resource, Debug)]
pub struct ProjectilePool {
    free: Vec<ProjectileEntity>,
    registered: usize,
    prewarm: usize,
}

impl ProjectilePool {
    pub fn new(prewarm: usize) -> Self {
        Self {
            free: Vec::with_capacity(prewarm),
            registered: 0,
            prewarm,
        }
    }

    #[inline]
    pub fn pop_free(&mut self) -> Option<ProjectileEntity> {
        self.free.pop()
    }

    #[inline]
    pub fn push_free(&mut self, e: ProjectileEntity) {
        self.free.push(e);
    }

    /// Count a freshly spawned pooled entity.
    #[inline]
    pub fn register(&mut self) {
        self.registered += 1;
    }

    #[inline]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Every pooled entity ever created, active or not.
    #[inline]
    pub fn registered(&self) -> usize {
        self.registered
    }

    #[inline]
    pub fn in_use(&self) -> usize {
        self.registered - self.free.len()
    }

    #[inline]
    pub fn prewarm(&self) -> usize {
        self.prewarm
    }
}

/// Components of a pooled projectile sitting in the free list.
pub fn inactive_projectile() -> impl Bundle {
    (
        Name::new("Projectile(Pooled)"),
        PooledProjectile,
        ProjectileState::Inactive,
        Projectile::default(),
        Motion::default(),
        Lifetimes::default(),
        AttachedGraphic::default(),
        Transform::from_xyz(0.0, 0.0, 2.0),
        Visibility::Hidden,
    )
}

/// Pre-spawn pooled projectiles (inactive).
///
/// Projectiles have no collider or rigid body: the collision probe queries
/// targets on their behalf, so an inactive projectile is simply skipped.
pub fn init_projectile_pool(mut commands: Commands, mut pool: ResMut<ProjectilePool>) {
    let n = pool.prewarm;
    pool.free.reserve(n);

    for _ in 0..n {
        let e = commands.spawn(inactive_projectile()).id();
        pool.free.push(ProjectileEntity(e));
        pool.registered += 1;
    }
    debug!("Projectile pool pre-warmed with {n} entities");
}
