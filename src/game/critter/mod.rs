//! Critter spawning and flow-field-driven movement.
//!
//! Critters carry no pathfinding of their own: each step they read the flow
//! direction of the cell they stand on and head for the center of the
//! neighbor it names. A topology edit invalidates the cached heading through
//! the grid's subscription hook, so the very next step follows the new
//! field.

mod components;

#[cfg(test)]
mod tests;

pub use components::{Critter, CritterReachedTarget, FlowWatcher, NextWaypoint};

use bevy::prelude::*;

use crate::game::fixed_math::{FixedNum, FixedVec2};
use crate::game::grid::GridMap;
use crate::game::simulation::{SimConfig, SimPosition, SimSet, SimTick, SimVelocity};
use crate::game::GameState;

/// Progress of the current wave. Spawning stops once `spawned` reaches the
/// configured wave size; the demo shell watches this to know when to exit.
#[derive(Resource, Debug, Default)]
pub struct WaveState {
    pub spawned: u32,
    pub next_spawn_tick: u64,
}

pub struct CritterPlugin;

impl Plugin for CritterPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WaveState>();
        app.add_message::<CritterReachedTarget>();
        app.add_systems(
            FixedUpdate,
            (
                // Spawning runs after the edit drain so a critter emitted
                // this tick already sees the tick's topology.
                spawn_wave_critters
                    .in_set(SimSet::Input)
                    .after(crate::game::editor::apply_edit_commands),
                follow_flow.in_set(SimSet::Steering),
            )
                .run_if(in_state(GameState::InGame)),
        );
        app.add_systems(Update, log_reached_critters);
    }
}

fn cell_center(x: i32, y: i32) -> FixedVec2 {
    let half = FixedNum::from_num(0.5);
    FixedVec2::new(FixedNum::from_num(x) + half, FixedNum::from_num(y) + half)
}

fn cell_of(position: FixedVec2) -> (i32, i32) {
    (
        position.x.floor().to_num::<i32>(),
        position.y.floor().to_num::<i32>(),
    )
}

/// Emits the wave's critters at the spawner on the configured tick cadence.
/// Spawning holds (and re-arms the timer) while the map has no spawner or no
/// valid path, mirroring the wave-start gate.
fn spawn_wave_critters(
    mut commands: Commands,
    mut map: ResMut<GridMap>,
    mut wave: ResMut<WaveState>,
    tick: Res<SimTick>,
    sim: Res<SimConfig>,
) {
    if wave.spawned >= sim.wave_size || tick.0 < wave.next_spawn_tick {
        return;
    }
    let Some((spawn_x, spawn_y)) = map.spawner_cell() else {
        return;
    };
    if !map.is_valid_path() {
        debug!("holding wave: spawner has no route to the target");
        wave.next_spawn_tick = tick.0 + sim.spawn_interval_ticks;
        return;
    }

    let subscription = map.subscribe();
    commands.spawn((
        Critter,
        SimPosition(cell_center(spawn_x, spawn_y)),
        SimVelocity::default(),
        NextWaypoint::default(),
        FlowWatcher(subscription),
    ));
    wave.spawned += 1;
    wave.next_spawn_tick = tick.0 + sim.spawn_interval_ticks;
    info!(
        "spawned critter {}/{} at ({spawn_x}, {spawn_y})",
        wave.spawned, sim.wave_size
    );
}

/// Derives each critter's velocity from the flow field. Runs before
/// integration, so a critter never moves on a heading older than the last
/// completed recompute.
fn follow_flow(
    mut commands: Commands,
    mut map: ResMut<GridMap>,
    sim: Res<SimConfig>,
    mut reached: MessageWriter<CritterReachedTarget>,
    mut query: Query<
        (
            Entity,
            &SimPosition,
            &mut SimVelocity,
            &mut NextWaypoint,
            &FlowWatcher,
        ),
        With<Critter>,
    >,
) {
    let delta = sim.tick_delta();
    let step = sim.critter_speed * delta;

    for (entity, pos, mut vel, mut waypoint, watcher) in query.iter_mut() {
        if map.take_changed(watcher.0) {
            waypoint.0 = None;
        }

        let (cell_x, cell_y) = cell_of(pos.0);
        if map.is_target(cell_x, cell_y) {
            reached.write(CritterReachedTarget { entity });
            map.unsubscribe(watcher.0);
            commands.entity(entity).despawn();
            continue;
        }

        if waypoint.0.is_none() {
            let (dx, dy) = map.flow_dir(cell_x, cell_y).offset();
            if dx != 0 || dy != 0 {
                waypoint.0 = Some(cell_center(cell_x + dx, cell_y + dy));
            }
        }

        match waypoint.0 {
            // Unreached pocket (or mid-edit dead end): hold position.
            None => vel.0 = FixedVec2::ZERO,
            Some(target) => {
                let to_target = target - pos.0;
                let dist = to_target.manhattan_length();
                if dist <= step {
                    // Arrive this tick, re-derive from the new cell next tick.
                    vel.0 = to_target / delta;
                    waypoint.0 = None;
                } else {
                    // Per-axis clamp: each component lands on its waypoint
                    // line without overshooting, even when a mid-edge edit
                    // leaves the waypoint diagonal to the critter.
                    let max = sim.critter_speed;
                    vel.0 = FixedVec2::new(
                        (to_target.x / delta).clamp(-max, max),
                        (to_target.y / delta).clamp(-max, max),
                    );
                }
            }
        }
    }
}

fn log_reached_critters(mut reached: MessageReader<CritterReachedTarget>) {
    for message in reached.read() {
        info!("critter {:?} reached the target", message.entity);
    }
}
