//! World plugin: spawns arena walls.
//!
//! Walls are plain static colliders on `Layer::World`. Both hit masks include
//! that layer, so any projectile whose probe touches a wall is consumed.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::Layer;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;

const WALL_THICKNESS: f32 = 30.0;

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_arena);
}

fn spawn_arena(mut commands: Commands, tunables: Res<Tunables>) {
    let wall_color = Color::srgb(0.25, 0.27, 0.33);
    let half = tunables.arena_half_extents;
    let t = WALL_THICKNESS;

    let wall_layers = CollisionLayers::new(Layer::World, [Layer::Player, Layer::Enemy]);

    let mut spawn_wall = |name: &str, pos: Vec2, size: Vec2| {
        commands.spawn((
            Name::new(name.to_owned()),
            Sprite {
                color: wall_color,
                custom_size: Some(size),
                ..default()
            },
            Transform::from_translation(pos.extend(0.0)),
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            wall_layers,
            DespawnOnExit(GameState::InGame),
        ));
    };

    spawn_wall("WallTop", Vec2::new(0.0, half.y + t * 0.5), Vec2::new(half.x * 2.0 + t * 2.0, t));
    spawn_wall("WallBottom", Vec2::new(0.0, -half.y - t * 0.5), Vec2::new(half.x * 2.0 + t * 2.0, t));
    spawn_wall("WallLeft", Vec2::new(-half.x - t * 0.5, 0.0), Vec2::new(t, half.y * 2.0));
    spawn_wall("WallRight", Vec2::new(half.x + t * 0.5, 0.0), Vec2::new(t, half.y * 2.0));
}
