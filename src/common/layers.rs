//! Collision layers.
//!
//! Projectiles carry no collider of their own; these layers only describe
//! the *targets* the collision probe may hit.

use avian2d::prelude::*;

#[derive(PhysicsLayer, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    #[default]
    Default,
    World,
    Player,
    Enemy,
}

/// Targets a player-owned spawner may hit.
#[inline]
pub fn player_hit_mask() -> LayerMask {
    LayerMask::from([Layer::World, Layer::Enemy])
}

/// Targets an enemy-owned spawner may hit.
#[inline]
pub fn enemy_hit_mask() -> LayerMask {
    LayerMask::from([Layer::World, Layer::Player])
}
