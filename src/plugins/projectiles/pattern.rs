//! Pattern definitions: immutable, shared firing descriptions.
//!
//! A `PatternDefinition` is plain configuration. It is validated once when a
//! library is loaded (and again when a spawner arms it) and is read-only
//! afterwards, so any number of spawners can hold the same `Arc` at once.

use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::image::{ImagePattern, PatternBitmap};

/// Smallest collision extents a pattern may declare.
pub const MIN_EXTENTS: f32 = 0.05;

/// Smallest pixel stride for silhouette sampling.
pub const MIN_SAMPLE_STEP: u32 = 1;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern `{0}` must shoot at least one projectile")]
    NoProjectiles(String),
    #[error("pattern `{name}` samples its image with a step of {step}, minimum is {min}", min = MIN_SAMPLE_STEP)]
    StepTooSmall { name: String, step: u32 },
    #[error("pattern `{name}` has a non-positive cooldown ({cooldown})")]
    NonPositiveCooldown { name: String, cooldown: f32 },
    #[error("pattern `{name}` has extents {extents}, minimum is {min}", min = MIN_EXTENTS)]
    ExtentsTooSmall { name: String, extents: f32 },
    #[error("pattern `{name}` reverses direction with a non-positive period ({period})")]
    NonPositiveReversal { name: String, period: f32 },
    #[error("malformed pattern library: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AngleStyle {
    /// Spread the shot between a (possibly drifting) min and max rotation.
    Manual,
    /// Distribute the shot evenly around the full circle.
    #[default]
    Automatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PatternMethod {
    /// Angles come from the trajectory formulas.
    #[default]
    Default,
    /// One projectile per foreground pixel of a sampled bitmap.
    ImageSilhouette,
}

/// Swept shape used by the collision probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProbeShape {
    /// Axis-aligned box sweep: cheap, coarse.
    #[default]
    Box,
    /// Circle sweep: tighter, costlier.
    Circle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternDefinition {
    pub name: String,
    pub method: PatternMethod,

    pub projectile_count: u32,
    pub angle_style: AngleStyle,
    /// Number of "corners" faked through adaptive speed. 0 keeps the ring circular.
    pub vertex_number: u32,
    pub initial_min_rotation: f32,
    pub initial_max_rotation: f32,
    pub increase_angle: bool,
    pub min_rotation_step: f32,
    pub max_rotation_step: f32,
    pub clamp_min_rotation: f32,
    pub clamp_max_rotation: f32,
    pub influence_rotation_by_parent: bool,

    pub apply_randomness: bool,
    pub use_spread: bool,
    pub min_spread: f32,
    pub max_spread: f32,

    pub shot_cooldown: f32,
    pub idle_time: f32,
    pub projectile_duration: f32,

    pub speed: f32,
    pub adaptive_speed: bool,
    pub acceleration: f32,
    pub use_max_speed: bool,
    pub max_speed: f32,
    pub spawn_distance: f32,
    pub size_change_per_second: f32,

    pub spin: f32,
    pub spin_acceleration: f32,
    pub use_max_spin: bool,
    pub max_spin: f32,
    pub invert_spin: bool,

    pub change_direction: bool,
    pub change_direction_period: f32,

    pub extents: f32,
    /// Overrides the spawner's probe shape when set.
    pub collision_shape: Option<ProbeShape>,
    pub damage: f32,

    pub image: Option<ImagePattern>,

    /// Clip name forwarded to the audio layer on every shot.
    pub shot_sound: Option<Arc<str>>,
    pub pitch_variance: f32,
}

impl Default for PatternDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            method: PatternMethod::Default,
            projectile_count: 1,
            angle_style: AngleStyle::Automatic,
            vertex_number: 0,
            initial_min_rotation: 0.0,
            initial_max_rotation: 0.0,
            increase_angle: false,
            min_rotation_step: 0.0,
            max_rotation_step: 0.0,
            clamp_min_rotation: 0.0,
            clamp_max_rotation: 0.0,
            influence_rotation_by_parent: false,
            apply_randomness: false,
            use_spread: false,
            min_spread: 0.0,
            max_spread: 0.0,
            shot_cooldown: 0.5,
            idle_time: 0.0,
            projectile_duration: 5.0,
            speed: 200.0,
            adaptive_speed: false,
            acceleration: 0.0,
            use_max_speed: false,
            max_speed: 0.0,
            spawn_distance: 0.0,
            size_change_per_second: 0.0,
            spin: 0.0,
            spin_acceleration: 0.0,
            use_max_spin: false,
            max_spin: 0.0,
            invert_spin: false,
            change_direction: false,
            change_direction_period: 1.0,
            extents: 8.0,
            collision_shape: None,
            damage: 1.0,
            image: None,
            shot_sound: None,
            pitch_variance: 0.0,
        }
    }
}

impl PatternDefinition {
    /// A single projectile has no range to interpolate across, so it is always automatic.
    #[inline]
    pub fn effective_angle_style(&self) -> AngleStyle {
        if self.projectile_count <= 1 {
            AngleStyle::Automatic
        } else {
            self.angle_style
        }
    }

    #[inline]
    pub fn max_speed(&self) -> Option<f32> {
        self.use_max_speed.then_some(self.max_speed.abs())
    }

    #[inline]
    pub fn max_spin(&self) -> Option<f32> {
        self.use_max_spin.then_some(self.max_spin)
    }

    /// `None` means the projectile never reverses.
    #[inline]
    pub fn reversal_period(&self) -> Option<f32> {
        self.change_direction.then_some(self.change_direction_period)
    }

    pub fn validate(&self) -> Result<(), PatternError> {
        if self.projectile_count == 0 && self.method == PatternMethod::Default {
            return Err(PatternError::NoProjectiles(self.name.clone()));
        }
        if self.extents < MIN_EXTENTS {
            return Err(PatternError::ExtentsTooSmall { name: self.name.clone(), extents: self.extents });
        }
        if self.change_direction && self.change_direction_period <= 0.0 {
            return Err(PatternError::NonPositiveReversal {
                name: self.name.clone(),
                period: self.change_direction_period,
            });
        }
        if let Some(image) = &self.image {
            let step = image.step_x.min(image.step_y);
            if step < MIN_SAMPLE_STEP {
                return Err(PatternError::StepTooSmall { name: self.name.clone(), step });
            }
        }
        Ok(())
    }

    /// Continuous shooting re-arms on the cooldown, so it has to be positive.
    pub fn validate_continuous(&self) -> Result<(), PatternError> {
        if self.shot_cooldown <= 0.0 {
            return Err(PatternError::NonPositiveCooldown {
                name: self.name.clone(),
                cooldown: self.shot_cooldown,
            });
        }
        Ok(())
    }
}

/// Validated, shared pattern set loaded from configuration.
#[derive(Resource, Debug, Clone, Default)]
pub struct PatternLibrary {
    patterns: Vec<Arc<PatternDefinition>>,
}

const BUILTIN_PATTERNS: &str = include_str!("../../../assets/patterns.ron");

impl PatternLibrary {
    pub fn new(patterns: Vec<PatternDefinition>) -> Result<Self, PatternError> {
        for p in &patterns {
            p.validate()?;
        }
        Ok(Self { patterns: patterns.into_iter().map(Arc::new).collect() })
    }

    /// Parse a RON list of pattern definitions.
    pub fn from_ron(src: &str) -> Result<Self, PatternError> {
        let patterns: Vec<PatternDefinition> = ron::from_str(src)?;
        Self::new(patterns)
    }

    /// Patterns shipped with the engine. A broken asset yields an empty library.
    pub fn builtin() -> Self {
        Self::from_ron(BUILTIN_PATTERNS).unwrap_or_else(|e| {
            error!("Built-in pattern library rejected: {e}");
            Self::default()
        })
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Arc<PatternDefinition>> {
        self.patterns.get(index)
    }

    pub fn find(&self, name: &str) -> Option<&Arc<PatternDefinition>> {
        self.patterns.iter().find(|p| p.name == name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PatternDefinition>> {
        self.patterns.iter()
    }

    /// Give a silhouette pattern its bitmap. Returns false when no pattern
    /// with that name uses an image.
    ///
    /// Spawners that already hold the old `Arc` keep firing the old shape
    /// until they are rebuilt from the library.
    pub fn attach_bitmap(&mut self, name: &str, bitmap: Arc<PatternBitmap>) -> bool {
        let Some(slot) = self.patterns.iter_mut().find(|p| p.name == name) else {
            return false;
        };
        match &mut Arc::make_mut(slot).image {
            Some(image) => {
                image.set_bitmap(bitmap);
                true
            }
            None => false,
        }
    }
}
