//! Core plugin: shared resources and global settings.
//!
//! Inserted before every other plugin so `Tunables` can be read while they
//! build. A host app may insert its own `Tunables` first; it is kept.

use crate::common::tunables::Tunables;
use bevy::prelude::*;

pub fn plugin(app: &mut App) {
    app.init_resource::<Tunables>();
    app.insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.07)));
}
