//! Trajectory sampler: pure functions from a pattern (plus per-shot context)
//! to per-projectile headings and speed offsets.
//!
//! Angles are degrees, counter-clockwise, 0 = +X. Nothing in here touches the
//! ECS; the spawner owns the mutable inputs (drift, spin, output buffer).

use std::f32::consts::PI;

use bevy::prelude::*;
use rand::Rng;

use super::pattern::{AngleStyle, PatternDefinition};

pub const FULL_TURN: f32 = 360.0;

/// Inputs shared by every projectile of one shot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShotContext {
    /// Current (possibly accelerating) spin, degrees per second of elapsed time.
    pub spin: f32,
    pub parent_rotation: f32,
    /// Frame-clock time since start; drives the spin phase.
    pub elapsed: f32,
    /// One spread draw, applied to the whole shot.
    pub spread: f32,
}

/// Manual-angle bounds that may drift shot over shot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AngleDrift {
    pub min: f32,
    pub max: f32,
}

impl AngleDrift {
    pub fn new(def: &PatternDefinition) -> Self {
        Self { min: def.initial_min_rotation, max: def.initial_max_rotation }
    }

    /// Step both bounds and saturate them into their symmetric clamps.
    pub fn advance(&mut self, def: &PatternDefinition) {
        if !def.increase_angle {
            return;
        }
        let cmin = def.clamp_min_rotation.abs();
        let cmax = def.clamp_max_rotation.abs();
        self.min = (self.min + def.min_rotation_step).clamp(-cmin, cmin);
        self.max = (self.max + def.max_rotation_step).clamp(-cmax, cmax);
    }
}

/// Uniform draw in `[lo, hi)`; degenerate ranges return `lo`.
#[inline]
pub fn uniform(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if hi - lo <= f32::EPSILON {
        lo
    } else {
        rng.random_range(lo..hi)
    }
}

/// Spread is skipped for randomized patterns; the two are exclusive.
pub fn draw_spread(def: &PatternDefinition, rng: &mut impl Rng) -> f32 {
    if def.use_spread && !def.apply_randomness {
        uniform(rng, def.min_spread, def.max_spread)
    } else {
        0.0
    }
}

/// Linear interpolation across the drifted bounds. Requires `slots >= 2`.
#[inline]
pub fn manual_angle(i: usize, slots: usize, drift: AngleDrift, ctx: ShotContext) -> f32 {
    debug_assert!(slots >= 2);
    let fraction = i as f32 / (slots - 1) as f32;
    ctx.parent_rotation + drift.min + (drift.max - drift.min) * fraction + ctx.spread + ctx.elapsed * ctx.spin
}

/// Even distribution around the full turn. With `invert_spin`, odd slots spin the other way.
#[inline]
pub fn automatic_angle(i: usize, slots: usize, invert_spin: bool, ctx: ShotContext) -> f32 {
    let sign = if invert_spin && i % 2 == 1 { -1.0 } else { 1.0 };
    FULL_TURN / slots as f32 * i as f32 + ctx.elapsed * ctx.spin * sign + ctx.spread + ctx.parent_rotation
}

/// Sinusoidal speed/distance offset used to fake polygonal rings.
#[inline]
pub fn adaptive_speed_offset(vertex_number: u32, i: usize, slots: usize) -> f32 {
    if slots == 0 {
        return 0.0;
    }
    (vertex_number as f32 * 2.0 * (i as f32 / slots as f32) * PI).sin()
}

/// Unit heading for an angle in degrees.
#[inline]
pub fn heading(degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians())
}

/// Fill `out` with one heading per slot. Manual drift advances once per call.
pub fn sample_rotations(
    def: &PatternDefinition,
    slots: usize,
    ctx: ShotContext,
    drift: &mut AngleDrift,
    rng: &mut impl Rng,
    out: &mut Vec<f32>,
) {
    out.clear();
    let style = if slots <= 1 { AngleStyle::Automatic } else { def.angle_style };

    if def.apply_randomness {
        for _ in 0..slots {
            let angle = match style {
                AngleStyle::Manual => uniform(rng, drift.min, drift.max),
                AngleStyle::Automatic => uniform(rng, 0.0, FULL_TURN),
            };
            out.push(angle);
        }
        return;
    }

    match style {
        AngleStyle::Manual => {
            drift.advance(def);
            out.extend((0..slots).map(|i| manual_angle(i, slots, *drift, ctx)));
        }
        AngleStyle::Automatic => {
            out.extend((0..slots).map(|i| automatic_angle(i, slots, def.invert_spin, ctx)));
        }
    }
}
