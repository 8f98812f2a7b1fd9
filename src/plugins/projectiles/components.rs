use std::time::Duration;

use avian2d::prelude::*;
use bevy::prelude::*;

use super::pattern::ProbeShape;

#[derive(Component)]
pub struct PooledProjectile;

/// Marker for the visual child attached to an active projectile.
#[derive(Component)]
pub struct ProjectileVisual;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectileState {
    #[default]
    Inactive,
    Active,
    PendingReturn,
}

/// Free-list entry. Only the commit system creates these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProjectileEntity(pub Entity);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternStyle {
    /// Travels along its own heading.
    #[default]
    Default,
    /// Travels radially from the emission point, scaled by its launch distance.
    ImageSilhouette,
}

/// Config snapshot stamped at spawn time.
#[derive(Component, Clone)]
pub struct Projectile {
    pub owner: Option<Entity>,
    pub damage: f32,
    pub extents: f32,
    pub shape: ProbeShape,
    /// Unscaled probe shape, shared with the emitting spawner.
    pub probe: Collider,
    pub hit_mask: LayerMask,
    pub emission: Vec2,
    pub style: PatternStyle,
}

impl Default for Projectile {
    fn default() -> Self {
        Self {
            owner: None,
            damage: 0.0,
            extents: 1.0,
            shape: ProbeShape::Box,
            probe: Collider::rectangle(1.0, 1.0),
            hit_mask: LayerMask::NONE,
            emission: Vec2::ZERO,
            style: PatternStyle::Default,
        }
    }
}

/// Periodic direction flip. The first leg starts at the emitter, so the timer
/// is armed at half a period and widened to `period` after the first flip.
#[derive(Debug, Clone, PartialEq)]
pub struct Reversal {
    pub period: Duration,
    pub timer: Timer,
}

impl Reversal {
    pub fn new(period_secs: f32) -> Self {
        Self {
            period: Duration::from_secs_f32(period_secs),
            timer: Timer::from_seconds(period_secs * 0.5, TimerMode::Repeating),
        }
    }
}

#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Motion {
    pub heading: Vec2,
    pub speed: f32,
    pub acceleration: f32,
    pub max_speed: Option<f32>,
    /// Distance from the emission point right after launch.
    pub initial_distance: f32,
    pub size_change_per_second: f32,
    pub movement_allowed: bool,
}

#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct Lifetimes {
    pub lifetime: Timer,
    pub idle: Timer,
    pub reversal: Option<Reversal>,
}

#[derive(Component, Debug, Default)]
pub struct AttachedGraphic(pub Option<Entity>);

/// Visual template instantiated as a child of each projectile a pattern fires.
#[derive(Clone, Debug)]
pub struct ProjectileGraphic {
    pub sprite: Sprite,
}

impl ProjectileGraphic {
    pub fn dot(color: Color, size: f32) -> Self {
        Self {
            sprite: Sprite {
                color,
                custom_size: Some(Vec2::splat(size)),
                ..default()
            },
        }
    }
}
