//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - we then call `bullet_hell::game::configure_headless` to install gameplay plugins.
//! - time advances a fixed 1/60 s per `update()` so frame counts map to seconds.

#![allow(dead_code)]

use std::time::Duration;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use bullet_hell::common::state::GameState;
use bullet_hell::common::tunables::Tunables;
use bullet_hell::plugins;
use bullet_hell::plugins::projectiles::ProjectilesPlugin;
use bullet_hell::plugins::projectiles::components::ProjectileState;

pub const FRAME: f32 = 1.0 / 60.0;

pub fn app_headless() -> App {
    let mut app = App::new();

    // Add AssetPlugin + ScenePlugin so SceneSpawner exists.
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(FRAME)));

    bullet_hell::game::configure_headless(&mut app);
    app
}

/// Physics, projectiles and combat only: no player, enemies or walls, so
/// the only colliders are the ones a test spawns.
pub fn app_projectiles_only() -> App {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
        // Collider positions come from propagated transforms.
        bevy::transform::TransformPlugin,
    ));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(FRAME)));
    app.init_resource::<Tunables>();
    app.init_state::<GameState>();
    app.add_plugins((plugins::physics::plugin, ProjectilesPlugin, plugins::combat::plugin));
    app
}

pub fn run_frames(app: &mut App, n: usize) {
    for _ in 0..n {
        app.update();
    }
}

pub fn active_projectiles(app: &mut App) -> Vec<Entity> {
    app.world_mut()
        .query::<(Entity, &ProjectileState)>()
        .iter(app.world())
        .filter(|(_, s)| **s == ProjectileState::Active)
        .map(|(e, _)| e)
        .collect()
}
