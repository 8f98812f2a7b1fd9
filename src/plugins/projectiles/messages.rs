//! Buffered projectile intents.
//!
//! Spawners never touch the pool: they write `SpawnProjectileRequest`s and
//! the allocator is the single consumer that pops the free list. Hits follow
//! the same shape: the probe writes `ProjectileHit`, resolution consumes it.

use avian2d::prelude::*;
use bevy::prelude::*;

use super::components::{PatternStyle, ProjectileGraphic};
use super::pattern::{PatternDefinition, ProbeShape};

/// Kinematic parameters resolved for one projectile at fire time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Launch {
    pub speed: f32,
    pub acceleration: f32,
    pub max_speed: Option<f32>,
    pub duration: f32,
    pub idle_time: f32,
    pub size_change_per_second: f32,
    pub reversal_period: Option<f32>,
    /// Distance travelled along the heading before the first frame.
    pub initial_distance: f32,
}

impl Launch {
    pub fn from_pattern(def: &PatternDefinition, speed: f32, initial_distance: f32) -> Self {
        Self {
            speed,
            acceleration: def.acceleration,
            max_speed: def.max_speed(),
            duration: def.projectile_duration,
            idle_time: def.idle_time,
            size_change_per_second: def.size_change_per_second,
            reversal_period: def.reversal_period(),
            initial_distance,
        }
    }
}

#[derive(Message, Clone)]
pub struct SpawnProjectileRequest {
    pub owner: Entity,
    pub emission: Vec2,
    pub position: Vec2,
    pub heading_degrees: f32,
    pub style: PatternStyle,
    pub launch: Launch,
    pub damage: f32,
    pub extents: f32,
    pub shape: ProbeShape,
    pub probe: Collider,
    pub hit_mask: LayerMask,
    pub graphic: Option<ProjectileGraphic>,
}

#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProjectileHit {
    pub projectile: Entity,
    /// Collider entity reported by the probe.
    pub target: Entity,
}

/// Force every active projectile back into the pool this tick.
#[derive(Message, Clone, Copy, Debug, Default)]
pub struct ClearProjectiles;
