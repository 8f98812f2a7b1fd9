//! Enemies plugin: stationary damageable emitters with a short death state.
//!
//! ---------------------------
//! HOW THIS IS DESIGNED (ECS)
//! ---------------------------
//! 1) FACTS live in components:
//!    - `Health` (combat) and `EnemyLifeState` describe gameplay reality.
//!    - `PatternSpawner` describes what the enemy is firing.
//!
//! 2) RULES mutate facts in predictable places:
//!    - projectile hit resolution (elsewhere) drains `Health`.
//!    - combat announces `Died` once; this module reacts to it.
//!
//! 3) PRESENTATION is derived from facts:
//!    - hit flash tint comes from the combat `HitFlash` decorator.
//!    - shrink/fade is derived from the `Dying` timer.
//!
//! Despawning is centralized: death marks `PendingDespawn` and a PostUpdate
//! system removes the entity, so nothing else still holds queued work for it.

use std::sync::Arc;

use avian2d::prelude::*;
use bevy::ecs::message::MessageReader;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::{Layer, enemy_hit_mask};
use crate::common::state::GameState;
use crate::plugins::combat::{CombatSystems, Died, HitFlash, HitSound, Health};
use crate::plugins::projectiles::components::ProjectileGraphic;
use crate::plugins::projectiles::pattern::{PatternDefinition, PatternLibrary, PatternMethod, ProbeShape};
use crate::plugins::projectiles::spawner::{PatternSpawner, ShootingMode};

const ENEMY_COLOR: Color = Color::srgb(0.9, 0.25, 0.25);
const DYING_SECS: f32 = 0.35;

#[derive(Component, Debug, Clone, Copy)]
pub struct Enemy;

/// Enemy lifecycle state machine.
///
/// - Alive: normal gameplay, spawner firing.
/// - Dying: short shrink/fade, no collisions, no shots.
/// - Dead: terminal marker to stop further state transitions.
#[derive(Component, Debug, Clone)]
pub enum EnemyLifeState {
    Alive,
    Dying { timer: Timer },
    Dead,
}

/// Marker: enemy should be removed from the world.
#[derive(Component, Debug, Clone, Copy)]
pub struct PendingDespawn;

pub fn plugin(app: &mut App) {
    // Spawn enemies once per entry into InGame.
    app.add_systems(OnEnter(GameState::InGame), spawn_targets);

    // Death reacts to combat's `Died`, which is written after projectile hits resolve.
    app.add_systems(
        Update,
        (enemy_death_trigger, enemy_death_progress)
            .chain()
            .after(CombatSystems)
            .run_if(in_state(GameState::InGame)),
    );

    // PostUpdate structural cleanup.
    app.add_systems(
        PostUpdate,
        despawn_marked_enemies.run_if(in_state(GameState::InGame)),
    );
}

// -----------------------------------------------------------------------------
// Spawn
// -----------------------------------------------------------------------------

/// Collision layers for an enemy that should no longer interact with anything.
///
/// Memberships are cleared too: projectile probes filter on membership, so a
/// dying enemy stops absorbing shots immediately.
#[inline]
fn non_interacting_enemy_layers() -> CollisionLayers {
    CollisionLayers::NONE
}

/// Patterns an enemy can fire right now. Silhouette patterns without a
/// bitmap would only log every shot, so they are left out.
fn fireable(library: &PatternLibrary) -> Vec<Arc<PatternDefinition>> {
    library
        .iter()
        .filter(|p| p.name != crate::plugins::player::PLAYER_PATTERN)
        .filter(|p| {
            p.method != PatternMethod::ImageSilhouette
                || p.image.as_ref().is_some_and(|i| i.bitmap().is_some())
        })
        .cloned()
        .collect()
}

/// Build an enemy spawner already firing `index` (wrapped) continuously.
pub fn armed_enemy_spawner(patterns: Vec<Arc<PatternDefinition>>, index: usize) -> Option<PatternSpawner> {
    if patterns.is_empty() {
        return None;
    }
    let graphics = patterns
        .iter()
        .map(|p| ProjectileGraphic::dot(Color::srgb(1.0, 0.55, 0.3), p.extents))
        .collect();
    let n = patterns.len();

    let mut spawner = PatternSpawner::new(patterns, enemy_hit_mask(), ProbeShape::Box).with_graphics(graphics);
    if let Err(e) = spawner.shoot(index % n, ShootingMode::Continuous) {
        error!("Enemy spawner refused to arm: {e}");
    }
    Some(spawner)
}

/// Spawn a few stationary targets, each firing a different library pattern.
fn spawn_targets(mut commands: Commands, library: Res<PatternLibrary>) {
    let enemy_layers = CollisionLayers::new(Layer::Enemy, [Layer::World, Layer::Player]);
    let patterns = fireable(&library);
    if patterns.is_empty() {
        warn!("Pattern library has nothing enemies can fire");
    }

    for (i, x) in [-300.0, 0.0, 300.0].into_iter().enumerate() {
        let mut enemy = commands.spawn((
            Name::new(format!("EnemyTarget{i}")),
            Enemy,
            Health::new(40.0, 10.0),
            HitFlash::new(ENEMY_COLOR),
            HitSound(Arc::from("enemy_hit")),
            EnemyLifeState::Alive,
            Sprite {
                color: ENEMY_COLOR,
                custom_size: Some(Vec2::splat(32.0)),
                ..default()
            },
            Transform::from_xyz(x, 200.0, 1.0),
            RigidBody::Static,
            Collider::circle(16.0),
            enemy_layers,
            DespawnOnExit(GameState::InGame),
        ));
        if let Some(spawner) = armed_enemy_spawner(patterns.clone(), i) {
            enemy.insert(spawner);
        }
    }
}

// -----------------------------------------------------------------------------
// Rules: enemy death lifecycle
// -----------------------------------------------------------------------------

/// Transition Alive -> Dying on `Died`.
///
/// Note: this system does not despawn.
/// It only transitions state and enforces "dying invariants" (no collisions, no shots).
fn enemy_death_trigger(
    mut died: MessageReader<Died>,
    mut q: Query<(
        &mut EnemyLifeState,
        &mut CollisionLayers,
        &mut Sprite,
        &mut Transform,
        Option<&mut PatternSpawner>,
    ), (With<Enemy>, Without<PendingDespawn>)>,
) {
    for ev in died.read() {
        let Ok((mut life, mut layers, mut sprite, mut tf, spawner)) = q.get_mut(ev.entity) else {
            continue;
        };
        if !matches!(*life, EnemyLifeState::Alive) {
            continue;
        }

        *life = EnemyLifeState::Dying {
            timer: Timer::from_seconds(DYING_SECS, TimerMode::Once),
        };
        *layers = non_interacting_enemy_layers();
        if let Some(mut spawner) = spawner {
            spawner.stop_shooting();
        }

        // Immediate readability: a neutral tint and reset scale.
        sprite.color = Color::srgba(0.8, 0.8, 0.8, 1.0);
        tf.scale = Vec3::ONE;
        debug!("Enemy {} dying", ev.entity);
    }
}

/// Animate Dying state and mark PendingDespawn once finished.
fn enemy_death_progress(
    time: Res<Time>,
    mut commands: Commands,
    mut q: Query<(Entity, &mut EnemyLifeState, &mut Sprite, &mut Transform), (With<Enemy>, Without<PendingDespawn>)>,
) {
    for (e, mut life, mut sprite, mut tf) in &mut q {
        let EnemyLifeState::Dying { timer } = &mut *life else {
            continue;
        };

        timer.tick(time.delta());

        // Normalized [0..1] for simple animation curves.
        let dur = timer.duration().as_secs_f32().max(0.0001);
        let t = (timer.elapsed_secs() / dur).clamp(0.0, 1.0);

        tf.scale = Vec3::splat(1.0 - t);

        let mut c = sprite.color.to_srgba();
        c.alpha = 1.0 - t;
        sprite.color = c.into();

        if timer.is_finished() {
            *life = EnemyLifeState::Dead;
            commands.entity(e).insert(PendingDespawn);
        }
    }
}

// -----------------------------------------------------------------------------
// Cleanup (PostUpdate)
// -----------------------------------------------------------------------------

/// Despawn enemies marked for removal.
fn despawn_marked_enemies(mut commands: Commands, q: Query<Entity, With<PendingDespawn>>) {
    for e in &q {
        commands.entity(e).despawn();
    }
}
