//! Pattern spawner: the per-emitter state machine that times shots.
//!
//! ```text
//!            shoot / shoot_times
//!   Idle ───────────────────────────▶ Armed ──┐
//!    ▲                                  │      │ cooldown > 0: count down, accelerate spin
//!    │  stop_shooting (any state)       │ ◀────┘
//!    └──────────────────────────────────┤
//!    ▲                                  │ cooldown <= 0: fire one shot, reset cooldown
//!    └──── FixedCount exhausted ────────┘
//! ```
//!
//! A spawner never holds projectiles. A shot is a batch of
//! `SpawnProjectileRequest`s; the allocator turns them into pooled entities.

use std::sync::Arc;

use avian2d::prelude::*;
use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;
use rand::Rng;
use rand_pcg::Pcg32;
use thiserror::Error;

use super::collision::probe_collider;
use super::components::{PatternStyle, ProjectileGraphic};
use super::messages::{Launch, SpawnProjectileRequest};
use super::pattern::{PatternDefinition, PatternError, PatternMethod, ProbeShape};
use super::sampler::{AngleDrift, ShotContext, adaptive_speed_offset, draw_spread, sample_rotations};
use crate::common::sound::PlaySound;
use crate::plugins::combat::CombatModifiers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShootingMode {
    /// Fire a fixed number of shots, then go idle.
    #[default]
    FixedCount,
    /// Fire on every cooldown until stopped.
    Continuous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpawnerState {
    #[default]
    Idle,
    Armed,
}

#[derive(Debug, Error)]
pub enum SpawnerError {
    #[error("shot count must be positive, got {0}")]
    InvalidShotCount(i32),
    #[error("pattern index {index} out of range ({len} patterns)")]
    UnknownPattern { index: usize, len: usize },
    #[error("{patterns} patterns but {graphics} projectile graphics")]
    GraphicsMismatch { patterns: usize, graphics: usize },
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Seeded randomness shared by every spawner.
#[derive(Resource, Debug, Clone)]
pub struct PatternRng(pub Pcg32);

impl PatternRng {
    pub fn seeded(seed: u64) -> Self {
        use rand::SeedableRng;
        Self(Pcg32::seed_from_u64(seed))
    }
}

#[derive(Component)]
pub struct PatternSpawner {
    patterns: Vec<Arc<PatternDefinition>>,
    /// Empty, or one entry per pattern.
    graphics: Vec<ProjectileGraphic>,
    hit_mask: LayerMask,
    probe_shape: ProbeShape,
    is_player: bool,

    state: SpawnerState,
    current: usize,
    mode: ShootingMode,
    shots_remaining: u32,
    cooldown: f32,
    spin: f32,
    drift: AngleDrift,
    rotations: Vec<f32>,
    /// Unscaled probe for the armed pattern.
    probe: Collider,
}

impl PatternSpawner {
    pub fn new(patterns: Vec<Arc<PatternDefinition>>, hit_mask: LayerMask, probe_shape: ProbeShape) -> Self {
        Self {
            patterns,
            graphics: Vec::new(),
            hit_mask,
            probe_shape,
            is_player: false,
            state: SpawnerState::Idle,
            current: 0,
            mode: ShootingMode::FixedCount,
            shots_remaining: 0,
            cooldown: 0.0,
            spin: 0.0,
            drift: AngleDrift::default(),
            rotations: Vec::new(),
            probe: probe_collider(probe_shape, 1.0, Vec2::ONE),
        }
    }

    pub fn with_graphics(mut self, graphics: Vec<ProjectileGraphic>) -> Self {
        self.graphics = graphics;
        self
    }

    /// Damage from this spawner is scaled by `CombatModifiers::damage_dealt`.
    pub fn as_player(mut self) -> Self {
        self.is_player = true;
        self
    }

    #[inline]
    pub fn state(&self) -> SpawnerState {
        self.state
    }

    #[inline]
    pub fn mode(&self) -> ShootingMode {
        self.mode
    }

    #[inline]
    pub fn shots_remaining(&self) -> u32 {
        self.shots_remaining
    }

    #[inline]
    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    #[inline]
    pub fn spin(&self) -> f32 {
        self.spin
    }

    #[inline]
    pub fn drift(&self) -> AngleDrift {
        self.drift
    }

    #[inline]
    pub fn current_pattern(&self) -> Option<&Arc<PatternDefinition>> {
        self.patterns.get(self.current)
    }

    #[inline]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Headings (degrees) of the most recent Default-method shot.
    #[inline]
    pub fn rotations(&self) -> &[f32] {
        &self.rotations
    }

    /// Arm a single shot (or endless fire in `Continuous`).
    pub fn shoot(&mut self, pattern: usize, mode: ShootingMode) -> Result<(), SpawnerError> {
        self.arm(pattern, mode, 1)
    }

    /// Arm `times` shots. Non-positive counts are rejected and the spawner is left as it was.
    pub fn shoot_times(&mut self, pattern: usize, mode: ShootingMode, times: i32) -> Result<(), SpawnerError> {
        let times = u32::try_from(times)
            .ok()
            .filter(|&t| t > 0)
            .ok_or(SpawnerError::InvalidShotCount(times))?;
        self.arm(pattern, mode, times)
    }

    fn arm(&mut self, pattern: usize, mode: ShootingMode, times: u32) -> Result<(), SpawnerError> {
        let def = self.patterns.get(pattern).ok_or(SpawnerError::UnknownPattern {
            index: pattern,
            len: self.patterns.len(),
        })?;
        if !self.graphics.is_empty() && self.graphics.len() != self.patterns.len() {
            return Err(SpawnerError::GraphicsMismatch {
                patterns: self.patterns.len(),
                graphics: self.graphics.len(),
            });
        }
        def.validate()?;
        if mode == ShootingMode::Continuous {
            def.validate_continuous()?;
        }

        let shape = def.collision_shape.unwrap_or(self.probe_shape);
        let slots = def.projectile_count as usize;

        self.probe = probe_collider(shape, def.extents, Vec2::ONE);
        self.spin = def.spin;
        self.drift = AngleDrift::new(def);
        self.rotations.clear();
        self.rotations.reserve(slots);
        self.current = pattern;
        self.mode = mode;
        self.shots_remaining = times;
        self.cooldown = 0.0;
        self.state = SpawnerState::Armed;
        Ok(())
    }

    /// Halt immediately. Timers stay as they are; the next `shoot` resets them.
    pub fn stop_shooting(&mut self) {
        self.state = SpawnerState::Idle;
    }

    /// Advance one frame. Returns the pattern when a shot fires this tick.
    ///
    /// For Default-method patterns the headings of that shot are left in
    /// [`Self::rotations`].
    pub fn tick(
        &mut self,
        dt: f32,
        elapsed: f32,
        parent_rotation: f32,
        rng: &mut impl Rng,
    ) -> Option<Arc<PatternDefinition>> {
        if self.state == SpawnerState::Idle {
            return None;
        }
        let def = self.patterns.get(self.current)?.clone();

        if self.cooldown > 0.0 {
            self.cooldown -= dt;
            self.accelerate_spin(&def, dt);
            return None;
        }

        if def.method == PatternMethod::Default {
            let ctx = ShotContext {
                spin: self.spin,
                parent_rotation: if def.influence_rotation_by_parent { parent_rotation } else { 0.0 },
                elapsed,
                spread: draw_spread(&def, rng),
            };
            sample_rotations(
                &def,
                def.projectile_count as usize,
                ctx,
                &mut self.drift,
                rng,
                &mut self.rotations,
            );
        }

        self.cooldown = def.shot_cooldown;
        if self.mode == ShootingMode::FixedCount {
            self.shots_remaining = self.shots_remaining.saturating_sub(1);
            if self.shots_remaining == 0 {
                self.state = SpawnerState::Idle;
            }
        }
        Some(def)
    }

    fn accelerate_spin(&mut self, def: &PatternDefinition, dt: f32) {
        if def.spin_acceleration == 0.0 {
            self.spin = def.spin;
            return;
        }
        self.spin += def.spin_acceleration * dt;
        if let Some(max) = def.max_spin() {
            let max = max.abs();
            self.spin = self.spin.clamp(-max, max);
        }
    }

    /// Build one request per projectile of the shot that `tick` just fired.
    pub fn for_each_launch(
        &self,
        owner: Entity,
        origin: Vec2,
        parent_rotation: f32,
        def: &PatternDefinition,
        damage_scale: f32,
        mut f: impl FnMut(SpawnProjectileRequest),
    ) {
        let damage = def.damage * if self.is_player { damage_scale } else { 1.0 };
        let shape = def.collision_shape.unwrap_or(self.probe_shape);
        let graphic = self.graphics.get(self.current);
        let request = |position: Vec2, heading_degrees: f32, style: PatternStyle, launch: Launch| {
            SpawnProjectileRequest {
                owner,
                emission: origin,
                position,
                heading_degrees,
                style,
                launch,
                damage,
                extents: def.extents,
                shape,
                probe: self.probe.clone(),
                hit_mask: self.hit_mask,
                graphic: graphic.cloned(),
            }
        };

        match def.method {
            PatternMethod::Default => {
                let slots = self.rotations.len();
                for (i, &angle) in self.rotations.iter().enumerate() {
                    let (speed, distance) = if def.adaptive_speed {
                        let off = adaptive_speed_offset(def.vertex_number, i, slots);
                        (def.speed + off, def.spawn_distance + off)
                    } else {
                        (def.speed, def.spawn_distance)
                    };
                    let launch = Launch::from_pattern(def, speed, distance);
                    f(request(origin, angle, PatternStyle::Default, launch));
                }
            }
            PatternMethod::ImageSilhouette => {
                let Some(offsets) = def.image.as_ref().and_then(|image| image.offsets()) else {
                    warn!("Pattern `{}` has no bitmap attached; shot skipped", def.name);
                    return;
                };
                let rot = if def.influence_rotation_by_parent {
                    Vec2::from_angle(parent_rotation.to_radians())
                } else {
                    Vec2::X
                };
                let launch = Launch::from_pattern(def, def.speed, 0.0);
                for &offset in offsets.iter() {
                    let offset = rot.rotate(offset);
                    let heading = offset.y.atan2(offset.x).to_degrees();
                    f(request(origin + offset, heading, PatternStyle::ImageSilhouette, launch));
                }
            }
        }
    }
}

/// Tick every spawner and enqueue the projectiles of the shots that fire.
///
/// Emitter poses are computed from this frame's `Transform`s rather than
/// read from `GlobalTransform`, which is only propagated in `PostUpdate`.
pub fn tick_pattern_spawners(
    time: Res<Time>,
    modifiers: Res<CombatModifiers>,
    mut rng: ResMut<PatternRng>,
    mut spawners: Query<(Entity, &mut PatternSpawner), With<Transform>>,
    transforms: TransformHelper,
    mut requests: MessageWriter<SpawnProjectileRequest>,
    mut sounds: MessageWriter<PlaySound>,
) {
    let dt = time.delta_secs();
    let elapsed = time.elapsed_secs();

    for (owner, mut spawner) in &mut spawners {
        let Ok(gt) = transforms.compute_global_transform(owner) else {
            continue;
        };
        let (_, rotation, translation) = gt.to_scale_rotation_translation();
        let parent_rotation = rotation.to_euler(EulerRot::XYZ).2.to_degrees();

        let Some(def) = spawner.tick(dt, elapsed, parent_rotation, &mut rng.0) else {
            continue;
        };

        spawner.for_each_launch(
            owner,
            translation.truncate(),
            parent_rotation,
            &def,
            modifiers.damage_dealt,
            |req| {
                requests.write(req);
            },
        );

        if let Some(clip) = &def.shot_sound {
            sounds.write(PlaySound::flat(clip.clone(), def.pitch_variance));
        }
    }
}
