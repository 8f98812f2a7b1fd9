//! Combat plugin: the damage-capable capability and the decorators that react to it.
//!
//! Projectiles only know `Damageable`. Everything that happens *because* of
//! damage (flash, sound, death) is a separate component reacting to
//! `DamageTaken` / `Died` messages, so an entity opts into each behaviour by
//! carrying the component.
//!
//! ```text
//!   resolve_projectile_hits ──DamageTaken──▶ flash_on_damage
//!                                        └─▶ play_hit_sounds
//!   announce_deaths (Health::is_dead) ──Died──▶ enemies / player
//!   (pickups, scripts) ──Heal──▶ apply_heals
//! ```

use std::sync::Arc;

use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;

use crate::common::sound::PlaySound;
use crate::common::state::GameState;
use crate::plugins::player::Player;
use crate::plugins::projectiles::ProjectileSystems;

/// Anything a projectile may hurt.
pub trait Damageable {
    fn take_damage(&mut self, amount: f32);
    fn is_dead(&self) -> bool;
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub health: f32,
    pub shield: f32,
    pub max_health: f32,
    pub max_shield: f32,
}

impl Health {
    /// Full health and a full shield.
    pub fn new(max_health: f32, max_shield: f32) -> Self {
        Self {
            health: max_health,
            shield: max_shield,
            max_health,
            max_shield,
        }
    }

    /// Heal health first; what does not fit tops up the shield.
    pub fn take_heals(&mut self, amount: f32, heal_received: f32) {
        let amount = (amount * heal_received).max(0.0);
        let missing = self.max_health - self.health;
        if amount <= missing {
            self.health += amount;
        } else {
            self.health = self.max_health;
            self.shield = (self.shield + amount - missing).min(self.max_shield);
        }
    }
}

impl Damageable for Health {
    /// Shield absorbs first; overflow reaches health.
    fn take_damage(&mut self, amount: f32) {
        let amount = amount.max(0.0);
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        self.health = (self.health - (amount - absorbed)).max(0.0);
    }

    #[inline]
    fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

/// Player-side damage scaling. Constructed once per app, never global.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct CombatModifiers {
    pub damage_dealt: f32,
    pub damage_received: f32,
    pub heal_received: f32,
}

impl Default for CombatModifiers {
    fn default() -> Self {
        Self {
            damage_dealt: 1.0,
            damage_received: 1.0,
            heal_received: 1.0,
        }
    }
}

#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct DamageTaken {
    pub target: Entity,
    pub amount: f32,
    /// Emitter whose projectile landed.
    pub source: Option<Entity>,
}

/// Restore health to `target`. Heals on the player are scaled by
/// `CombatModifiers::heal_received`; the dead stay dead.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct Heal {
    pub target: Entity,
    pub amount: f32,
}

/// Written once per entity, the tick its health reaches zero.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Died {
    pub entity: Entity,
}

/// Terminal marker so `Died` is never written twice.
#[derive(Component, Debug, Clone, Copy)]
pub struct Dead;

/// Tint towards white on damage, decaying back to `base`.
#[derive(Component, Debug, Clone, Copy)]
pub struct HitFlash {
    intensity: f32,
    pub base: Color,
    /// Intensity lost per second.
    pub decay: f32,
}

impl HitFlash {
    pub fn new(base: Color) -> Self {
        Self { intensity: 0.0, base, decay: 8.0 }
    }

    #[inline]
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    #[inline]
    fn trigger(&mut self) {
        self.intensity = 1.0;
    }

    #[inline]
    fn decay_to_zero(&mut self, dt: f32) {
        self.intensity = (self.intensity - self.decay * dt).max(0.0);
    }

    /// Base colour pushed towards white by the current intensity.
    pub fn color(&self) -> Color {
        let mut out = self.base.to_srgba();
        let k = self.intensity * 0.55;
        out.red = (out.red + k).min(1.0);
        out.green = (out.green + k).min(1.0);
        out.blue = (out.blue + k).min(1.0);
        out.into()
    }
}

/// Damage reactions; runs after projectile hits resolve.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CombatSystems;

/// Clip played whenever this entity takes damage.
#[derive(Component, Debug, Clone)]
pub struct HitSound(pub Arc<str>);

pub fn plugin(app: &mut App) {
    app.init_resource::<CombatModifiers>()
        .add_message::<DamageTaken>()
        .add_message::<Heal>()
        .add_message::<Died>();

    app.add_systems(
        Update,
        (apply_heals, flash_on_damage, play_hit_sounds, announce_deaths, decay_hit_flash)
            .chain()
            .in_set(CombatSystems)
            .after(ProjectileSystems)
            .run_if(in_state(GameState::InGame)),
    );
}

fn apply_heals(
    mut reader: MessageReader<Heal>,
    modifiers: Res<CombatModifiers>,
    mut q: Query<(&mut Health, Has<Player>), Without<Dead>>,
) {
    for heal in reader.read() {
        if let Ok((mut health, is_player)) = q.get_mut(heal.target) {
            let scale = if is_player { modifiers.heal_received } else { 1.0 };
            health.take_heals(heal.amount, scale);
        }
    }
}

fn flash_on_damage(mut reader: MessageReader<DamageTaken>, mut q: Query<&mut HitFlash>) {
    for hit in reader.read() {
        if let Ok(mut flash) = q.get_mut(hit.target) {
            flash.trigger();
        }
    }
}

fn play_hit_sounds(
    mut reader: MessageReader<DamageTaken>,
    q: Query<&HitSound>,
    mut sounds: MessageWriter<PlaySound>,
) {
    for hit in reader.read() {
        if let Ok(sound) = q.get(hit.target) {
            sounds.write(PlaySound::flat(sound.0.clone(), 0.1));
        }
    }
}

fn announce_deaths(
    mut commands: Commands,
    q: Query<(Entity, &Health), Without<Dead>>,
    mut died: MessageWriter<Died>,
) {
    for (e, health) in &q {
        if health.is_dead() {
            commands.entity(e).insert(Dead);
            died.write(Died { entity: e });
        }
    }
}

fn decay_hit_flash(time: Res<Time>, mut q: Query<(&mut HitFlash, &mut Sprite), Without<Dead>>) {
    let dt = time.delta_secs();
    for (mut flash, mut sprite) in &mut q {
        flash.decay_to_zero(dt);
        sprite.color = flash.color();
    }
}
