//! Projectiles plugin tests (Bevy 0.18 + Avian 0.5), **deterministic**.
//!
//! Nothing here runs the physics pipeline. Probe results are injected as
//! `ProjectileHit` messages, time is a hand-advanced `Time`, and randomness
//! is a fixed-seed `Pcg32`.

mod pipeline;

use std::time::Duration;

use bevy::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Helper: a `Time` whose last delta is `dt` and whose elapsed is `dt`.
pub(super) fn time_with_delta(dt: f32) -> Time {
    let mut t = Time::<()>::default();
    t.advance_by(Duration::from_secs_f32(dt));
    t
}

pub(super) fn rng() -> Pcg32 {
    Pcg32::seed_from_u64(0xB011E7)
}

pub(super) fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}
