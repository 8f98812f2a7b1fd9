//! Tunable gameplay constants.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct Tunables {
    pub pixels_per_meter: f32,
    pub player_speed: f32,
    /// Projectiles spawned inactive at startup. The pool grows past this on demand.
    pub pool_prewarm: usize,
    /// Half-size of the playable arena. Projectiles past it (plus a margin) retire.
    pub arena_half_extents: Vec2,
    pub rng_seed: u64,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 20.0,
            player_speed: 420.0,
            pool_prewarm: 512,
            arena_half_extents: Vec2::new(1024.0, 576.0),
            rng_seed: 0x5EED_B011_E7,
        }
    }
}
