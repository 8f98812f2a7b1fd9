//! Spawn consumer: activate projectiles from the pool.
//!
//! # Fail-fast invariants
//! - The pool free list contains only valid pooled projectile entities.
//! - Therefore, a pooled entity must match the projectile query.
//!
//! If this is violated, we `expect()` and crash loudly.
//! Everything a projectile carries is rewritten here on every activation, so
//! nothing from a previous life leaks into the next one.

use bevy::prelude::*;
use bevy::ecs::message::MessageReader;

use super::components::{
    AttachedGraphic, Lifetimes, Motion, PooledProjectile, Projectile, ProjectileEntity,
    ProjectileGraphic, ProjectileState, ProjectileVisual, Reversal,
};
use super::messages::SpawnProjectileRequest;
use super::pool::ProjectilePool;
use super::sampler::heading;

/// Component values of a freshly launched projectile.
pub struct Activation {
    pub projectile: Projectile,
    pub motion: Motion,
    pub lifetimes: Lifetimes,
    pub transform: Transform,
}

/// Resolve a request into initial component values.
///
/// The projectile is pushed `initial_distance` along its heading, then its
/// launch distance is re-measured from the emission point (silhouette shots
/// start away from the emitter without any push).
pub fn activation(req: &SpawnProjectileRequest) -> Activation {
    let dir = heading(req.heading_degrees);
    let launch = req.launch;
    let position = req.position + dir * launch.initial_distance;

    Activation {
        projectile: Projectile {
            owner: Some(req.owner),
            damage: req.damage,
            extents: req.extents,
            shape: req.shape,
            probe: req.probe.clone(),
            hit_mask: req.hit_mask,
            emission: req.emission,
            style: req.style,
        },
        motion: Motion {
            heading: dir,
            speed: launch.speed,
            acceleration: launch.acceleration,
            max_speed: launch.max_speed,
            initial_distance: position.distance(req.emission),
            size_change_per_second: launch.size_change_per_second,
            movement_allowed: launch.idle_time <= 0.0,
        },
        lifetimes: Lifetimes {
            lifetime: Timer::from_seconds(launch.duration.max(0.0), TimerMode::Once),
            idle: Timer::from_seconds(launch.idle_time.max(0.0), TimerMode::Once),
            reversal: launch.reversal_period.map(Reversal::new),
        },
        transform: Transform::from_translation(position.extend(2.0)),
    }
}

fn attach_graphic(commands: &mut Commands, parent: Entity, graphic: &ProjectileGraphic, heading_degrees: f32) -> Entity {
    commands
        .spawn((
            Name::new("ProjectileVisual"),
            ProjectileVisual,
            graphic.sprite.clone(),
            Transform::from_rotation(Quat::from_rotation_z(heading_degrees.to_radians())),
            ChildOf(parent),
        ))
        .id()
}

pub fn allocate_projectiles_from_pool(
    mut commands: Commands,
    mut pool: ResMut<ProjectilePool>,
    mut reader: MessageReader<SpawnProjectileRequest>,
    mut q: Query<(
        &mut ProjectileState,
        &mut Projectile,
        &mut Motion,
        &mut Lifetimes,
        &mut Transform,
        &mut Visibility,
        &mut AttachedGraphic,
    ), With<PooledProjectile>>,
) {
    for req in reader.read() {
        let a = activation(req);

        if let Some(ProjectileEntity(e)) = pool.pop_free() {
            let (mut state, mut projectile, mut motion, mut lifetimes, mut tf, mut vis, mut graphic) =
                q.get_mut(e).expect("ProjectilePool contained an entity missing pooled projectile components");

            *state = ProjectileState::Active;
            *projectile = a.projectile;
            *motion = a.motion;
            *lifetimes = a.lifetimes;
            *tf = a.transform;
            *vis = Visibility::Visible;
            graphic.0 = req
                .graphic
                .as_ref()
                .map(|g| attach_graphic(&mut commands, e, g, req.heading_degrees));
            continue;
        }

        // Free list exhausted: grow.
        let e = commands
            .spawn((
                Name::new("Projectile(Pooled)"),
                PooledProjectile,
                ProjectileState::Active,
                a.projectile,
                a.motion,
                a.lifetimes,
                a.transform,
                Visibility::Visible,
            ))
            .id();
        let child = req
            .graphic
            .as_ref()
            .map(|g| attach_graphic(&mut commands, e, g, req.heading_degrees));
        commands.entity(e).insert(AttachedGraphic(child));
        pool.register();
        debug!("Projectile pool grew to {} entities", pool.registered());
    }
}
