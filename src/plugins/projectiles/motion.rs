//! Projectile self-update: lifetime, direction reversal, idle gate, sizing,
//! acceleration and movement.
//!
//! Hits are resolved earlier in the same tick, so a projectile that was
//! struck is already `PendingReturn` and skipped here.

use std::time::Duration;

use bevy::prelude::*;

use super::components::{Lifetimes, Motion, PatternStyle, PooledProjectile, Projectile, ProjectileState};
use super::pattern::MIN_EXTENTS;
use crate::common::tunables::Tunables;

/// Distance past the arena edge a projectile may travel before it retires.
pub const OUT_OF_BOUNDS_MARGIN: f32 = 64.0;

/// Advance one projectile by `delta`. Returns `true` when it must retire.
pub fn step_projectile(
    motion: &mut Motion,
    lifetimes: &mut Lifetimes,
    tf: &mut Transform,
    style: PatternStyle,
    delta: Duration,
) -> bool {
    if lifetimes.lifetime.tick(delta).is_finished() {
        return true;
    }

    if let Some(reversal) = lifetimes.reversal.as_mut()
        && reversal.timer.tick(delta).just_finished()
    {
        motion.speed = -motion.speed;
        motion.acceleration = -motion.acceleration;
        reversal.timer.set_duration(reversal.period);
    }

    if !motion.movement_allowed {
        if lifetimes.idle.tick(delta).is_finished() {
            motion.movement_allowed = true;
        }
        return false;
    }

    let dt = delta.as_secs_f32();

    if motion.size_change_per_second != 0.0 {
        let grown = tf.scale + Vec3::splat(motion.size_change_per_second * dt);
        tf.scale = grown.max(Vec3::ZERO);
        if tf.scale.x <= MIN_EXTENTS && tf.scale.y <= MIN_EXTENTS {
            return true;
        }
    }

    motion.speed += motion.acceleration * dt;
    if let Some(max) = motion.max_speed {
        motion.speed = motion.speed.clamp(-max, max);
    }

    let step = match style {
        PatternStyle::Default => motion.heading * motion.speed,
        PatternStyle::ImageSilhouette => motion.heading * motion.speed * motion.initial_distance,
    };
    tf.translation += (step * dt).extend(0.0);
    false
}

#[inline]
fn out_of_bounds(position: Vec2, half_extents: Vec2) -> bool {
    let limit = half_extents + Vec2::splat(OUT_OF_BOUNDS_MARGIN);
    position.x.abs() > limit.x || position.y.abs() > limit.y
}

pub fn advance_projectiles(
    time: Res<Time>,
    tunables: Res<Tunables>,
    mut q: Query<
        (&mut ProjectileState, &mut Motion, &mut Lifetimes, &mut Transform, &Projectile),
        With<PooledProjectile>,
    >,
) {
    let delta = time.delta();

    for (mut state, mut motion, mut lifetimes, mut tf, projectile) in &mut q {
        if *state != ProjectileState::Active {
            continue;
        }
        let retire = step_projectile(&mut motion, &mut lifetimes, &mut tf, projectile.style, delta)
            || out_of_bounds(tf.translation.truncate(), tunables.arena_half_extents);
        if retire {
            *state = ProjectileState::PendingReturn;
        }
    }
}
