//! Player plugin.
//!
//! Pipeline:
//! - Update: (full app only) sample keyboard, write PlayerInput resource
//! - Update: arm / stop the player's spawner from `PlayerInput::firing`
//! - FixedUpdate: apply velocity to kinematic rigid body
//!
//! The player is a damageable target like any enemy. Enemy projectiles
//! reach it through `Layer::Player`; its own shots use the player hit mask.

use std::sync::Arc;

use avian2d::prelude::*;
use bevy::ecs::message::MessageReader;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::{Layer, player_hit_mask};
use crate::common::{state::GameState, tunables::Tunables};
use crate::plugins::combat::{Died, HitFlash, HitSound, Health};
use crate::plugins::projectiles::components::ProjectileGraphic;
use crate::plugins::projectiles::pattern::{PatternLibrary, ProbeShape};
use crate::plugins::projectiles::spawner::{PatternSpawner, ShootingMode, SpawnerState};
use crate::plugins::projectiles::ProjectileSystems;

/// Pattern the player fires while `firing` is held.
pub const PLAYER_PATTERN: &str = "player_stream";

const PLAYER_COLOR: Color = Color::srgb(0.2, 0.75, 0.9);

#[derive(Component)]
pub struct Player;

/// Written by whatever drives the player (keyboard in the full app, tests otherwise).
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct PlayerInput {
    pub move_axis: Vec2,
    pub firing: bool,
}

pub fn plugin(app: &mut App) {
    app.insert_resource(PlayerInput::default())
        .add_systems(OnEnter(GameState::InGame), spawn)
        .add_systems(
            Update,
            (stop_on_death, drive_player_fire)
                .chain()
                .before(ProjectileSystems)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(FixedUpdate, apply_movement);
}

/// Keyboard capture. Needs `InputPlugin`, so only the full app registers it.
pub fn input_plugin(app: &mut App) {
    app.add_systems(Update, gather_input.before(drive_player_fire));
}

fn spawn(mut commands: Commands, library: Res<PatternLibrary>) {
    let layers = CollisionLayers::new(Layer::Player, [Layer::World, Layer::Enemy]);

    let mut player = commands.spawn((
        Name::new("Player"),
        Player,
        Health::new(10.0, 5.0),
        HitFlash::new(PLAYER_COLOR),
        HitSound(Arc::from("player_hit")),
        Sprite {
            color: PLAYER_COLOR,
            custom_size: Some(Vec2::splat(26.0)),
            ..default()
        },
        Transform::from_xyz(0.0, -200.0, 1.0),
        RigidBody::Kinematic,
        Collider::circle(13.0),
        layers,
        LinearVelocity::ZERO,
        DespawnOnExit(GameState::InGame),
    ));

    match library.find(PLAYER_PATTERN) {
        Some(pattern) => {
            player.insert(
                PatternSpawner::new(vec![pattern.clone()], player_hit_mask(), ProbeShape::Circle)
                    .with_graphics(vec![ProjectileGraphic::dot(Color::srgb(0.6, 0.95, 1.0), 6.0)])
                    .as_player(),
            );
        }
        None => warn!("Pattern `{PLAYER_PATTERN}` missing from library; player cannot shoot"),
    }
}

fn gather_input(keys: Res<ButtonInput<KeyCode>>, mut input: ResMut<PlayerInput>) {
    let mut axis = Vec2::ZERO;

    if keys.pressed(KeyCode::KeyW) {
        axis.y += 1.0;
    }
    if keys.pressed(KeyCode::KeyS) {
        axis.y -= 1.0;
    }
    if keys.pressed(KeyCode::KeyA) {
        axis.x -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) {
        axis.x += 1.0;
    }

    input.move_axis = axis.normalize_or_zero();
    input.firing = keys.pressed(KeyCode::Space);
}

fn apply_movement(
    tunables: Res<Tunables>,
    input: Res<PlayerInput>,
    mut q_player: Query<&mut LinearVelocity, With<Player>>,
) {
    let Ok(mut vel) = q_player.single_mut() else {
        return;
    };
    vel.0 = input.move_axis * tunables.player_speed;
}

/// Start continuous fire on press, stop on release.
fn drive_player_fire(input: Res<PlayerInput>, mut q: Query<&mut PatternSpawner, With<Player>>) {
    let Ok(mut spawner) = q.single_mut() else {
        return;
    };
    match (input.firing, spawner.state()) {
        (true, SpawnerState::Idle) => {
            if let Err(e) = spawner.shoot(0, ShootingMode::Continuous) {
                error!("Player spawner refused to arm: {e}");
            }
        }
        (false, SpawnerState::Armed) => spawner.stop_shooting(),
        _ => {}
    }
}

/// A dead player stops shooting and ignores further input.
fn stop_on_death(
    mut commands: Commands,
    mut died: MessageReader<Died>,
    mut q: Query<&mut PatternSpawner, With<Player>>,
) {
    for ev in died.read() {
        if let Ok(mut spawner) = q.get_mut(ev.entity) {
            spawner.stop_shooting();
            commands.entity(ev.entity).remove::<PatternSpawner>();
            info!("Player died");
        }
    }
}
