//! Physics plugin.
//!
//! Projectiles never enter the solver; avian only hosts the target colliders
//! (walls, player, enemies) and answers the probe's shape casts through
//! `SpatialQuery`. Gravity is off: it is a top-down arena.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::tunables::Tunables;

pub fn plugin(app: &mut App) {
    let ppm = app.world().resource::<Tunables>().pixels_per_meter;
    app.add_plugins(PhysicsPlugins::default().with_length_unit(ppm));
    app.insert_resource(Gravity(Vec2::ZERO));
}
