//! Pool → allocator → motion/hits → commit, one system at a time.

use std::time::Duration;

use avian2d::prelude::*;
use bevy::ecs::message::Messages;
use bevy::prelude::*;

use super::{approx, time_with_delta};
use crate::common::layers::enemy_hit_mask;
use crate::common::test_utils::run_system_once;
use crate::common::tunables::Tunables;
use crate::plugins::combat::{CombatModifiers, DamageTaken, Health};
use crate::plugins::player::Player;
use crate::plugins::projectiles::components::*;
use crate::plugins::projectiles::messages::{ClearProjectiles, Launch, ProjectileHit, SpawnProjectileRequest};
use crate::plugins::projectiles::pattern::ProbeShape;
use crate::plugins::projectiles::{allocator, collision, commit, motion, pool};

// --------------------------------------------------------------------------------------
// Helpers
// --------------------------------------------------------------------------------------

fn request(launch: Launch) -> SpawnProjectileRequest {
    SpawnProjectileRequest {
        owner: Entity::PLACEHOLDER,
        emission: Vec2::ZERO,
        position: Vec2::ZERO,
        heading_degrees: 0.0,
        style: PatternStyle::Default,
        launch,
        damage: 2.0,
        extents: 4.0,
        shape: ProbeShape::Box,
        probe: Collider::rectangle(4.0, 4.0),
        hit_mask: enemy_hit_mask(),
        graphic: None,
    }
}

fn moving(speed: f32) -> Launch {
    Launch { speed, duration: 10.0, ..default() }
}

/// World with a pre-warmed pool and the message buffers the pipeline reads.
fn pooled_world(prewarm: usize) -> World {
    let mut world = World::new();
    world.insert_resource(pool::ProjectilePool::new(prewarm));
    world.init_resource::<Messages<SpawnProjectileRequest>>();
    world.init_resource::<Messages<ProjectileHit>>();
    world.init_resource::<Messages<ClearProjectiles>>();
    world.init_resource::<Messages<DamageTaken>>();
    world.init_resource::<CombatModifiers>();
    world.insert_resource(Tunables::default());
    run_system_once(&mut world, pool::init_projectile_pool);
    world
}

fn allocate(world: &mut World, reqs: impl IntoIterator<Item = SpawnProjectileRequest>) {
    {
        let mut msgs = world.resource_mut::<Messages<SpawnProjectileRequest>>();
        for r in reqs {
            msgs.write(r);
        }
    }
    run_system_once(world, allocator::allocate_projectiles_from_pool);
    world.resource_mut::<Messages<SpawnProjectileRequest>>().update();
}

fn active(world: &mut World) -> Vec<Entity> {
    world
        .query::<(Entity, &ProjectileState)>()
        .iter(world)
        .filter(|(_, s)| **s == ProjectileState::Active)
        .map(|(e, _)| e)
        .collect()
}

fn state(world: &World, e: Entity) -> ProjectileState {
    *world.get::<ProjectileState>(e).unwrap()
}

// --------------------------------------------------------------------------------------
// Pool
// --------------------------------------------------------------------------------------

#[test]
fn init_pool_spawns_prewarm_inactive_hidden() {
    let mut world = pooled_world(8);

    let p = world.resource::<pool::ProjectilePool>();
    assert_eq!((p.free_len(), p.registered(), p.in_use()), (8, 8, 0));

    let mut q = world.query::<(&PooledProjectile, &ProjectileState, &Visibility)>();
    assert_eq!(q.iter(&world).count(), 8);
    for (_, state, vis) in q.iter(&world) {
        assert_eq!(*state, ProjectileState::Inactive);
        assert_eq!(*vis, Visibility::Hidden);
    }
}

#[test]
fn acquire_hands_out_distinct_projectiles() {
    let mut world = pooled_world(4);
    allocate(&mut world, (0..4).map(|_| request(moving(1.0))));

    let mut act = active(&mut world);
    act.sort();
    act.dedup();
    assert_eq!(act.len(), 4);
    assert_eq!(world.resource::<pool::ProjectilePool>().free_len(), 0);
}

#[test]
fn exhausted_pool_grows_instead_of_dropping() {
    let mut world = pooled_world(2);
    allocate(&mut world, (0..5).map(|_| request(moving(1.0))));

    assert_eq!(active(&mut world).len(), 5);
    let p = world.resource::<pool::ProjectilePool>();
    assert_eq!((p.registered(), p.in_use()), (5, 5));
}

#[test]
fn released_projectile_is_reused_before_growing() {
    let mut world = pooled_world(1);
    allocate(&mut world, [request(moving(1.0))]);
    let first = active(&mut world)[0];

    *world.get_mut::<ProjectileState>(first).unwrap() = ProjectileState::PendingReturn;
    run_system_once(&mut world, commit::return_to_pool_commit);

    allocate(&mut world, [request(moving(1.0))]);
    assert_eq!(active(&mut world), vec![first]);
    assert_eq!(world.resource::<pool::ProjectilePool>().registered(), 1);
}

#[test]
fn full_volley_returns_once_and_is_reused_without_growth() {
    let prewarm = Tunables::default().pool_prewarm;
    let mut world = pooled_world(prewarm);
    allocate(&mut world, (0..prewarm).map(|_| request(moving(1.0))));

    run_system_once(&mut world, commit::retire_all_projectiles);
    run_system_once(&mut world, commit::return_to_pool_commit);
    // Only PendingReturn entities are pushed, so a second commit is a no-op.
    run_system_once(&mut world, commit::return_to_pool_commit);
    assert_eq!(world.resource::<pool::ProjectilePool>().free_len(), prewarm);

    allocate(&mut world, (0..prewarm).map(|_| request(moving(1.0))));
    let mut act = active(&mut world);
    act.sort();
    act.dedup();
    assert_eq!(act.len(), prewarm);
    assert_eq!(world.resource::<pool::ProjectilePool>().registered(), prewarm);
}

// --------------------------------------------------------------------------------------
// Allocator
// --------------------------------------------------------------------------------------

#[test]
fn allocation_stamps_every_field() {
    let mut world = pooled_world(1);
    let mut req = request(Launch {
        speed: 50.0,
        duration: 3.0,
        idle_time: 0.5,
        reversal_period: Some(2.0),
        initial_distance: 10.0,
        ..default()
    });
    req.position = Vec2::new(1.0, 1.0);
    req.emission = Vec2::new(1.0, 1.0);
    req.heading_degrees = 90.0;
    allocate(&mut world, [req]);

    let e = active(&mut world)[0];
    let tf = world.get::<Transform>(e).unwrap();
    assert!(tf.translation.truncate().abs_diff_eq(Vec2::new(1.0, 11.0), 1e-4));
    assert_eq!(tf.scale, Vec3::ONE);
    assert_eq!(*world.get::<Visibility>(e).unwrap(), Visibility::Visible);

    let m = world.get::<Motion>(e).unwrap();
    assert!(m.heading.abs_diff_eq(Vec2::Y, 1e-6));
    assert_eq!(m.speed, 50.0);
    assert!(approx(m.initial_distance, 10.0));
    assert!(!m.movement_allowed);

    let l = world.get::<Lifetimes>(e).unwrap();
    assert_eq!(l.lifetime.remaining_secs(), 3.0);
    assert_eq!(l.idle.remaining_secs(), 0.5);
    let reversal = l.reversal.as_ref().expect("reversal armed");
    assert_eq!(reversal.timer.remaining_secs(), 1.0);
    assert_eq!(reversal.period, Duration::from_secs(2));

    let p = world.get::<Projectile>(e).unwrap();
    assert_eq!(p.damage, 2.0);
    assert_eq!(p.hit_mask, enemy_hit_mask());
}

#[test]
fn graphic_is_attached_as_child_and_despawned_on_return() {
    let mut world = pooled_world(1);
    let mut req = request(moving(1.0));
    req.graphic = Some(ProjectileGraphic::dot(Color::WHITE, 4.0));
    allocate(&mut world, [req]);

    let e = active(&mut world)[0];
    let child = world.get::<AttachedGraphic>(e).unwrap().0.expect("graphic attached");
    assert_eq!(world.get::<ChildOf>(child).unwrap().parent(), e);
    assert!(world.get::<ProjectileVisual>(child).is_some());

    *world.get_mut::<ProjectileState>(e).unwrap() = ProjectileState::PendingReturn;
    run_system_once(&mut world, commit::return_to_pool_commit);

    assert!(world.get_entity(child).is_err());
    assert_eq!(world.get::<AttachedGraphic>(e).unwrap().0, None);
}

// --------------------------------------------------------------------------------------
// Commit
// --------------------------------------------------------------------------------------

#[test]
fn commit_restores_inactive_invariants() {
    let mut world = pooled_world(1);
    allocate(&mut world, [request(moving(30.0))]);
    let e = active(&mut world)[0];

    *world.get_mut::<ProjectileState>(e).unwrap() = ProjectileState::PendingReturn;
    run_system_once(&mut world, commit::return_to_pool_commit);

    assert_eq!(state(&world, e), ProjectileState::Inactive);
    assert_eq!(*world.get::<Visibility>(e).unwrap(), Visibility::Hidden);
    assert_eq!(*world.get::<Motion>(e).unwrap(), Motion::default());
    assert_eq!(world.resource::<pool::ProjectilePool>().free_len(), 1);

    // Running again does not release twice.
    run_system_once(&mut world, commit::return_to_pool_commit);
    assert_eq!(world.resource::<pool::ProjectilePool>().free_len(), 1);
}

#[test]
fn clear_request_retires_every_active_projectile() {
    let mut world = pooled_world(3);
    allocate(&mut world, (0..3).map(|_| request(moving(1.0))));

    // No message: nothing happens.
    run_system_once(&mut world, commit::clear_projectiles_on_request);
    assert_eq!(active(&mut world).len(), 3);

    world.resource_mut::<Messages<ClearProjectiles>>().write(ClearProjectiles);
    run_system_once(&mut world, commit::clear_projectiles_on_request);
    run_system_once(&mut world, commit::return_to_pool_commit);

    assert!(active(&mut world).is_empty());
    assert_eq!(world.resource::<pool::ProjectilePool>().free_len(), 3);
}

// --------------------------------------------------------------------------------------
// Motion (pure step)
// --------------------------------------------------------------------------------------

fn secs(s: f32) -> Duration {
    Duration::from_secs_f32(s)
}

fn launched(launch: Launch) -> (Motion, Lifetimes, Transform) {
    let a = allocator::activation(&request(launch));
    (a.motion, a.lifetimes, a.transform)
}

#[test]
fn moves_along_heading() {
    let (mut m, mut l, mut tf) = launched(moving(10.0));
    assert!(!motion::step_projectile(&mut m, &mut l, &mut tf, PatternStyle::Default, secs(0.5)));
    assert!(tf.translation.truncate().abs_diff_eq(Vec2::new(5.0, 0.0), 1e-5));
}

#[test]
fn reversal_flips_at_half_period_then_every_period() {
    let (mut m, mut l, mut tf) = launched(Launch {
        speed: 10.0,
        acceleration: 1.0,
        duration: 100.0,
        reversal_period: Some(2.0),
        ..default()
    });

    let mut flips = Vec::new();
    let mut sign = m.speed.signum();
    for tick in 1..=24 {
        motion::step_projectile(&mut m, &mut l, &mut tf, PatternStyle::Default, secs(0.25));
        if m.speed.signum() != sign {
            sign = m.speed.signum();
            flips.push(tick as f32 * 0.25);
            // Acceleration flips together with speed.
            assert_eq!(m.acceleration.signum(), sign);
        }
    }
    assert_eq!(flips, vec![1.0, 3.0, 5.0]);
}

#[test]
fn lifetime_retires_even_while_idle() {
    let (mut m, mut l, mut tf) = launched(Launch { speed: 10.0, duration: 1.0, idle_time: 5.0, ..default() });
    let mut t = 0.0;
    loop {
        t += 0.25;
        if motion::step_projectile(&mut m, &mut l, &mut tf, PatternStyle::Default, secs(0.25)) {
            break;
        }
        assert!(t < 1.0, "projectile outlived its lifetime");
    }
    assert_eq!(t, 1.0);
    assert_eq!(tf.translation, Vec3::new(0.0, 0.0, 2.0));
}

#[test]
fn idle_time_holds_position_then_releases() {
    let (mut m, mut l, mut tf) = launched(Launch { speed: 10.0, duration: 10.0, idle_time: 0.5, ..default() });

    motion::step_projectile(&mut m, &mut l, &mut tf, PatternStyle::Default, secs(0.25));
    motion::step_projectile(&mut m, &mut l, &mut tf, PatternStyle::Default, secs(0.25));
    assert!(m.movement_allowed);
    assert_eq!(tf.translation.x, 0.0);

    motion::step_projectile(&mut m, &mut l, &mut tf, PatternStyle::Default, secs(0.25));
    assert!(approx(tf.translation.x, 2.5));
}

#[test]
fn shrinking_to_nothing_retires() {
    let (mut m, mut l, mut tf) = launched(Launch {
        speed: 1.0,
        duration: 10.0,
        size_change_per_second: -1.0,
        ..default()
    });
    assert!(!motion::step_projectile(&mut m, &mut l, &mut tf, PatternStyle::Default, secs(0.5)));
    assert!(approx(tf.scale.x, 0.5));
    assert!(motion::step_projectile(&mut m, &mut l, &mut tf, PatternStyle::Default, secs(0.5)));
}

#[test]
fn acceleration_clamped_to_max_speed() {
    let (mut m, mut l, mut tf) = launched(Launch {
        speed: 10.0,
        acceleration: 100.0,
        max_speed: Some(20.0),
        duration: 10.0,
        ..default()
    });
    motion::step_projectile(&mut m, &mut l, &mut tf, PatternStyle::Default, secs(1.0));
    assert_eq!(m.speed, 20.0);

    // Reversed speed clamps symmetrically.
    m.speed = -50.0;
    m.acceleration = 0.0;
    motion::step_projectile(&mut m, &mut l, &mut tf, PatternStyle::Default, secs(0.1));
    assert_eq!(m.speed, -20.0);
}

#[test]
fn silhouette_moves_radially_scaled_by_launch_distance() {
    let mut req = request(moving(0.5));
    req.position = Vec2::new(0.0, 4.0);
    req.heading_degrees = 90.0;
    req.style = PatternStyle::ImageSilhouette;
    let a = allocator::activation(&req);
    let (mut m, mut l, mut tf) = (a.motion, a.lifetimes, a.transform);
    assert!(approx(m.initial_distance, 4.0));

    motion::step_projectile(&mut m, &mut l, &mut tf, PatternStyle::ImageSilhouette, secs(1.0));
    assert!(tf.translation.truncate().abs_diff_eq(Vec2::new(0.0, 6.0), 1e-5));
}

#[test]
fn advance_system_retires_out_of_bounds() {
    let mut world = pooled_world(2);
    world.insert_resource(Tunables { arena_half_extents: Vec2::splat(100.0), ..default() });
    world.insert_resource(time_with_delta(0.1));

    let mut far = request(moving(0.0));
    far.position = Vec2::new(100.0 + motion::OUT_OF_BOUNDS_MARGIN + 1.0, 0.0);
    allocate(&mut world, [request(moving(0.0)), far]);
    let act = active(&mut world);

    run_system_once(&mut world, motion::advance_projectiles);

    let states: Vec<_> = act.iter().map(|e| state(&world, *e)).collect();
    assert!(states.contains(&ProjectileState::Active));
    assert!(states.contains(&ProjectileState::PendingReturn));
}

// --------------------------------------------------------------------------------------
// Hit resolution (ProjectileHit injected instead of a SpatialQuery)
// --------------------------------------------------------------------------------------

fn hit(world: &mut World, projectile: Entity, target: Entity) {
    world.resource_mut::<Messages<ProjectileHit>>().write(ProjectileHit { projectile, target });
}

fn damage_events(world: &World) -> Vec<DamageTaken> {
    let msgs = world.resource::<Messages<DamageTaken>>();
    let mut cursor = msgs.get_cursor();
    cursor.read(msgs).copied().collect()
}

#[test]
fn hit_damages_target_and_retires_projectile() {
    let mut world = pooled_world(1);
    allocate(&mut world, [request(moving(1.0))]);
    let p = active(&mut world)[0];
    let target = world.spawn(Health::new(10.0, 0.0)).id();

    hit(&mut world, p, target);
    hit(&mut world, p, target);
    run_system_once(&mut world, collision::resolve_projectile_hits);

    // Deduped: one hit per projectile per tick.
    assert_eq!(world.get::<Health>(target).unwrap().health, 8.0);
    assert_eq!(state(&world, p), ProjectileState::PendingReturn);
    assert_eq!(damage_events(&world).len(), 1);
}

#[test]
fn hit_on_collider_child_damages_its_body() {
    let mut world = pooled_world(1);
    allocate(&mut world, [request(moving(1.0))]);
    let p = active(&mut world)[0];
    let body = world.spawn(Health::new(10.0, 0.0)).id();
    let collider = world.spawn(ColliderOf { body }).id();

    hit(&mut world, p, collider);
    run_system_once(&mut world, collision::resolve_projectile_hits);

    assert_eq!(world.get::<Health>(body).unwrap().health, 8.0);
}

#[test]
fn scenery_hit_still_consumes_projectile() {
    let mut world = pooled_world(1);
    allocate(&mut world, [request(moving(1.0))]);
    let p = active(&mut world)[0];
    let wall = world.spawn_empty().id();

    hit(&mut world, p, wall);
    run_system_once(&mut world, collision::resolve_projectile_hits);

    assert_eq!(state(&world, p), ProjectileState::PendingReturn);
    assert!(damage_events(&world).is_empty());
}

#[test]
fn player_damage_is_scaled_by_received_modifier() {
    let mut world = pooled_world(1);
    world.insert_resource(CombatModifiers { damage_received: 0.5, ..default() });
    allocate(&mut world, [request(moving(1.0))]);
    let p = active(&mut world)[0];
    let player = world.spawn((Player, Health::new(10.0, 0.0))).id();

    hit(&mut world, p, player);
    run_system_once(&mut world, collision::resolve_projectile_hits);

    assert_eq!(world.get::<Health>(player).unwrap().health, 9.0);
}

#[test]
fn inactive_projectile_hits_are_ignored() {
    let mut world = pooled_world(1);
    let p = world.query_filtered::<Entity, With<PooledProjectile>>().iter(&world).next().unwrap();
    let target = world.spawn(Health::new(10.0, 0.0)).id();

    hit(&mut world, p, target);
    run_system_once(&mut world, collision::resolve_projectile_hits);

    assert_eq!(world.get::<Health>(target).unwrap().health, 10.0);
    assert_eq!(state(&world, p), ProjectileState::Inactive);
}
