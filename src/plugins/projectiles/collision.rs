//! Collision probe and hit resolution.
//!
//! Projectiles carry no collider or rigid body. Every frame each active
//! projectile sweeps its probe shape one extent ahead along its heading and
//! reports the first collider in its hit mask. Resolution is split out so
//! tests can inject `ProjectileHit`s without a physics step.

use avian2d::prelude::*;
use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use super::components::{Motion, PooledProjectile, Projectile, ProjectileState};
use super::messages::ProjectileHit;
use super::pattern::ProbeShape;
use crate::plugins::combat::{CombatModifiers, DamageTaken, Damageable, Health};
use crate::plugins::player::Player;

/// Probe collider for `extents` at the given visual scale.
pub fn probe_collider(shape: ProbeShape, extents: f32, scale: Vec2) -> Collider {
    match shape {
        ProbeShape::Box => Collider::rectangle(extents * scale.x, extents * scale.y),
        ProbeShape::Circle => Collider::circle(extents * 0.5 * scale.x),
    }
}

pub fn probe_projectile_hits(
    spatial: SpatialQuery,
    q: Query<(Entity, &ProjectileState, &Projectile, &Motion, &Transform), With<PooledProjectile>>,
    mut hits: MessageWriter<ProjectileHit>,
) {
    for (e, state, projectile, motion, tf) in &q {
        if *state != ProjectileState::Active {
            continue;
        }

        let heading = if motion.speed < 0.0 { -motion.heading } else { motion.heading };
        let Ok(direction) = Dir2::new(heading) else {
            continue;
        };

        let scale = tf.scale.truncate();
        let rescaled;
        let probe = if scale == Vec2::ONE {
            &projectile.probe
        } else {
            rescaled = probe_collider(projectile.shape, projectile.extents, scale);
            &rescaled
        };

        let config = ShapeCastConfig::from_max_distance(projectile.extents * scale.max_element());
        let filter = SpatialQueryFilter::from_mask(projectile.hit_mask);

        if let Some(hit) = spatial.cast_shape(probe, tf.translation.truncate(), 0.0, direction, &config, &filter) {
            hits.write(ProjectileHit { projectile: e, target: hit.entity });
        }
    }
}

/// Deliver damage for probe hits and mark the projectiles for return.
///
/// Any hit consumes the projectile, damageable or not.
pub fn resolve_projectile_hits(
    mut reader: MessageReader<ProjectileHit>,
    modifiers: Res<CombatModifiers>,
    mut q_projectiles: Query<(&Projectile, &mut ProjectileState), With<PooledProjectile>>,
    q_collider_of: Query<&ColliderOf>,
    mut q_health: Query<(&mut Health, Has<Player>)>,
    mut damaged: MessageWriter<DamageTaken>,
    // Per-frame dedupe: one hit per projectile.
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    for hit in reader.read() {
        if !seen.insert(hit.projectile) {
            continue;
        }
        let Ok((projectile, mut state)) = q_projectiles.get_mut(hit.projectile) else {
            continue;
        };
        if *state != ProjectileState::Active {
            continue;
        }

        let target = q_collider_of.get(hit.target).map_or(hit.target, |c| c.body);

        if let Ok((mut health, is_player)) = q_health.get_mut(target) {
            let amount = if is_player {
                projectile.damage * modifiers.damage_received
            } else {
                projectile.damage
            };
            health.take_damage(amount);
            damaged.write(DamageTaken { target, amount, source: projectile.owner });
        }

        *state = ProjectileState::PendingReturn;
    }
}
