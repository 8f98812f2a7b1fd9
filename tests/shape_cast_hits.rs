mod common;

use avian2d::prelude::*;
use bevy::prelude::*;
use bullet_hell::common::layers::{Layer, enemy_hit_mask};
use bullet_hell::plugins::combat::Health;
use bullet_hell::plugins::projectiles::collision::probe_collider;
use bullet_hell::plugins::projectiles::components::{PatternStyle, Projectile, ProjectileState};
use bullet_hell::plugins::projectiles::messages::{Launch, SpawnProjectileRequest};
use bullet_hell::plugins::projectiles::pattern::ProbeShape;

const DAMAGE: f32 = 3.0;
const EXTENTS: f32 = 8.0;

/// 20x20 static target centred at (100, 0): its faces are at x = 90 and x = 110.
fn spawn_target(app: &mut App, membership: Layer) -> Entity {
    let target = app
        .world_mut()
        .spawn((
            Name::new("Target"),
            Health::new(50.0, 0.0),
            RigidBody::Static,
            Collider::rectangle(20.0, 20.0),
            CollisionLayers::new(membership, [Layer::Player, Layer::Enemy]),
            Transform::from_xyz(100.0, 0.0, 0.0),
        ))
        .id();
    // Let a few fixed steps put the collider into the spatial query pipeline.
    common::run_frames(app, 6);
    target
}

/// Enemy-owned shot heading +x.
fn enemy_shot(position: Vec2, shape: ProbeShape, speed: f32) -> SpawnProjectileRequest {
    SpawnProjectileRequest {
        owner: Entity::PLACEHOLDER,
        emission: position,
        position,
        heading_degrees: 0.0,
        style: PatternStyle::Default,
        launch: Launch { speed, duration: 10.0, ..default() },
        damage: DAMAGE,
        extents: EXTENTS,
        shape,
        probe: probe_collider(shape, EXTENTS, Vec2::ONE),
        hit_mask: enemy_hit_mask(),
        graphic: None,
    }
}

/// Fires one request and returns the pooled entity that took it.
fn fire(app: &mut App, req: SpawnProjectileRequest) -> Entity {
    let emission = req.emission;
    app.world_mut().write_message(req);
    app.update();
    app.world_mut()
        .query::<(Entity, &Projectile)>()
        .iter(app.world())
        .find(|(_, p)| p.owner.is_some() && p.emission == emission)
        .map(|(e, _)| e)
        .expect("request was allocated")
}

fn health(app: &App, e: Entity) -> f32 {
    app.world().get::<Health>(e).unwrap().health
}

fn state(app: &App, e: Entity) -> ProjectileState {
    *app.world().get::<ProjectileState>(e).unwrap()
}

#[test]
fn box_cast_hits_target_in_mask_and_applies_damage() {
    let mut app = common::app_projectiles_only();
    let target = spawn_target(&mut app, Layer::Player);

    // Right face at 84, 6 units short of the target; cast reach is 8.
    let p = fire(&mut app, enemy_shot(Vec2::new(80.0, 0.0), ProbeShape::Box, 0.0));

    assert_eq!(health(&app, target), 50.0 - DAMAGE);
    assert_eq!(state(&app, p), ProjectileState::Inactive);
}

#[test]
fn target_outside_hit_mask_is_ignored() {
    let mut app = common::app_projectiles_only();
    let target = spawn_target(&mut app, Layer::Enemy);

    let p = fire(&mut app, enemy_shot(Vec2::new(80.0, 0.0), ProbeShape::Box, 0.0));
    common::run_frames(&mut app, 3);

    assert_eq!(health(&app, target), 50.0);
    assert_eq!(state(&app, p), ProjectileState::Active);
}

#[test]
fn shrunken_projectile_reaches_less_far() {
    let mut app = common::app_projectiles_only();
    let target = spawn_target(&mut app, Layer::Player);

    // Fired well clear of the target, then parked at the spot where a full
    // size projectile would connect.
    let p = fire(&mut app, enemy_shot(Vec2::new(-300.0, 0.0), ProbeShape::Box, 0.0));
    assert_eq!(state(&app, p), ProjectileState::Active);

    {
        let mut tf = app.world_mut().get_mut::<Transform>(p).unwrap();
        tf.translation = Vec3::new(80.0, 0.0, 2.0);
        tf.scale = Vec3::splat(0.25);
    }
    app.update();
    assert_eq!(health(&app, target), 50.0);
    assert_eq!(state(&app, p), ProjectileState::Active);

    app.world_mut().get_mut::<Transform>(p).unwrap().scale = Vec3::ONE;
    app.update();
    assert_eq!(health(&app, target), 50.0 - DAMAGE);
    assert_eq!(state(&app, p), ProjectileState::Inactive);
}

#[test]
fn circle_cast_follows_reversed_heading() {
    let mut app = common::app_projectiles_only();
    let target = spawn_target(&mut app, Layer::Player);

    // Heading +x points away from the target; negative speed casts back
    // towards it. Circle radius 4 leaves a 2 unit gap to the face at 110.
    let p = fire(&mut app, enemy_shot(Vec2::new(116.0, 0.0), ProbeShape::Circle, -1.0));

    assert_eq!(health(&app, target), 50.0 - DAMAGE);
    assert_eq!(state(&app, p), ProjectileState::Inactive);
}

#[test]
fn circle_cast_misses_beyond_its_radius() {
    let mut app = common::app_projectiles_only();
    let target = spawn_target(&mut app, Layer::Player);

    // Radius 4 plus reach 8: the face at 90 is out of range from x = 77.
    let p = fire(&mut app, enemy_shot(Vec2::new(77.0, 0.0), ProbeShape::Circle, 0.0));

    assert_eq!(health(&app, target), 50.0);
    assert_eq!(state(&app, p), ProjectileState::Active);
}
