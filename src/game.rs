use bevy::prelude::*;

pub mod config;
pub mod critter;
pub mod editor;
pub mod fixed_math;
pub mod grid;
pub mod simulation;

use config::GameConfigPlugin;
use critter::{Critter, CritterPlugin, WaveState};
use editor::EditorPlugin;
use grid::GridPlugin;
use simulation::{SimConfig, SimulationPlugin};

/// Top-level session state. `InGame` runs waves over the active map;
/// `Editor` keeps the simulation ticking for edit commands but spawns no
/// critters.
#[derive(States, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    #[default]
    InGame,
    Editor,
}

/// Map requested on the command line: a file path or an indexed map name.
/// `None` starts a blank grid sized from the initial config.
#[derive(Resource, Debug, Default)]
pub struct RequestedMap(pub Option<String>);

/// When set, the app exits once the wave has fully spawned and the last
/// critter is gone. The headless binary turns this on; a library consumer
/// embedding the plugins keeps running.
#[derive(Resource, Debug, Default)]
pub struct ExitAfterWave(pub bool);

pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>();
        app.init_resource::<RequestedMap>();
        app.init_resource::<ExitAfterWave>();
        app.add_plugins((
            GameConfigPlugin,
            SimulationPlugin,
            GridPlugin,
            EditorPlugin,
            CritterPlugin,
        ));
        app.add_systems(
            Update,
            exit_when_wave_done.run_if(in_state(GameState::InGame)),
        );
    }
}

fn exit_when_wave_done(
    exit_after: Res<ExitAfterWave>,
    wave: Res<WaveState>,
    sim_config: Res<SimConfig>,
    critters: Query<(), With<Critter>>,
    mut exit: MessageWriter<AppExit>,
) {
    if !exit_after.0 {
        return;
    }
    if wave.spawned >= sim_config.wave_size && critters.is_empty() {
        info!("wave complete: all {} critters resolved", wave.spawned);
        exit.write(AppExit::Success);
    }
}
