//! Tests for critter spawning and flow-following movement.
//!
//! These drive the real systems in a minimal `App`, the grid as a plain
//! resource and the schedules stepped by hand, so a "tick" here is one
//! `app.update()`.

use super::*;
use crate::game::grid::GridMap;
use crate::game::simulation::{
    apply_velocity, increment_sim_tick, SimConfig, SimPosition, SimTick, SimVelocity,
};
use bevy::prelude::*;

fn test_sim_config() -> SimConfig {
    SimConfig {
        tick_rate: 10.0,
        critter_speed: FixedNum::from_num(2.0),
        spawn_interval_ticks: 5,
        wave_size: 3,
    }
}

/// App with the movement systems and a grid installed as a resource.
/// Returns the app; spawn critters through `spawn_critter`.
fn movement_app(map: GridMap) -> App {
    let mut app = App::new();
    app.insert_resource(test_sim_config());
    app.insert_resource(map);
    app.init_resource::<SimTick>();
    app.add_message::<CritterReachedTarget>();
    app.add_systems(Update, (follow_flow, apply_velocity).chain());
    app
}

fn spawn_critter(app: &mut App, x: i32, y: i32) -> Entity {
    let subscription = app.world_mut().resource_mut::<GridMap>().subscribe();
    app.world_mut()
        .spawn((
            Critter,
            SimPosition(cell_center(x, y)),
            SimVelocity::default(),
            NextWaypoint::default(),
            FlowWatcher(subscription),
        ))
        .id()
}

fn critter_count(app: &mut App) -> usize {
    let mut query = app.world_mut().query_filtered::<(), With<Critter>>();
    query.iter(app.world()).count()
}

#[test]
fn critter_walks_a_corridor_to_the_target() {
    let mut map = GridMap::new(5, 1, "corridor");
    map.set_target(4, 0);
    map.set_spawner(0, 0);
    let mut app = movement_app(map);
    let entity = spawn_critter(&mut app, 0, 0);

    // 4 cells at 2 cells/s and 10 ticks/s is 20 ticks of travel; allow a few
    // extra for waypoint re-derivation on arrival at each center.
    for _ in 0..40 {
        app.update();
    }

    assert_eq!(critter_count(&mut app), 0, "critter should have despawned");
    assert!(app.world().get_entity(entity).is_err());
    assert_eq!(
        app.world_mut().resource_mut::<GridMap>().subscriber_count(),
        0,
        "despawn must release the subscription"
    );
}

#[test]
fn critter_reroutes_when_a_wall_lands_ahead() {
    let mut map = GridMap::new(3, 3, "reroute");
    map.set_target(2, 0);
    map.set_spawner(0, 0);
    let mut app = movement_app(map);
    spawn_critter(&mut app, 0, 0);

    // Let it commit to the straight route, then block it.
    app.update();
    app.update();
    app.world_mut()
        .resource_mut::<GridMap>()
        .set_wall(1, 0, true);
    assert!(app.world().resource::<GridMap>().is_valid_path());

    // Detour is (0,0) → (0,1) → (1,1) → (2,1) → (2,0): 4 cells to cross
    // plus whatever was already walked. 60 ticks is generous.
    for _ in 0..60 {
        app.update();
    }
    assert_eq!(critter_count(&mut app), 0, "critter should reach via the detour");
}

#[test]
fn pocketed_critter_holds_position() {
    let mut map = GridMap::new(3, 1, "pocket");
    map.set_target(2, 0);
    map.set_spawner(0, 0);
    map.set_wall(1, 0, true);
    assert!(!map.is_valid_path());

    let mut app = movement_app(map);
    let entity = spawn_critter(&mut app, 0, 0);

    for _ in 0..10 {
        app.update();
    }

    let pos = app.world().get::<SimPosition>(entity).expect("still alive").0;
    assert_eq!(pos, cell_center(0, 0), "no route, no movement");
}

#[test]
fn wave_spawns_on_the_configured_cadence() {
    let mut map = GridMap::new(5, 1, "wave");
    map.set_target(4, 0);
    map.set_spawner(0, 0);

    let mut app = App::new();
    app.insert_resource(test_sim_config());
    app.insert_resource(map);
    app.init_resource::<SimTick>();
    app.init_resource::<WaveState>();
    app.add_message::<CritterReachedTarget>();
    // Spawning only: no movement, so critters accumulate and stay countable.
    app.add_systems(Update, (increment_sim_tick, spawn_wave_critters).chain());

    app.update();
    assert_eq!(critter_count(&mut app), 1, "first critter spawns immediately");

    // The next spawn waits out the interval.
    for _ in 0..4 {
        app.update();
    }
    assert_eq!(critter_count(&mut app), 1);
    app.update();
    assert_eq!(critter_count(&mut app), 2);

    // The wave stops at its configured size.
    for _ in 0..50 {
        app.update();
    }
    assert_eq!(critter_count(&mut app), 3);
    assert_eq!(app.world().resource::<WaveState>().spawned, 3);
}

#[test]
fn wave_holds_while_the_path_is_invalid() {
    let mut map = GridMap::new(3, 1, "blocked");
    map.set_target(2, 0);
    map.set_spawner(0, 0);
    map.set_wall(1, 0, true);

    let mut app = App::new();
    app.insert_resource(test_sim_config());
    app.insert_resource(map);
    app.init_resource::<SimTick>();
    app.init_resource::<WaveState>();
    app.add_message::<CritterReachedTarget>();
    app.add_systems(Update, (increment_sim_tick, spawn_wave_critters).chain());

    for _ in 0..20 {
        app.update();
    }
    assert_eq!(critter_count(&mut app), 0, "no spawns without a valid path");

    // Unblocking lets the wave start.
    app.world_mut()
        .resource_mut::<GridMap>()
        .set_wall(1, 0, false);
    for _ in 0..20 {
        app.update();
    }
    assert!(critter_count(&mut app) > 0);
}
