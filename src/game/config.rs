use bevy::prelude::*;
use bevy_common_assets::ron::RonAssetPlugin;
use serde::{Deserialize, Serialize};

/// Static configuration loaded once at startup. These values feed the
/// deterministic simulation (grid size, critter speed, wave pacing), so they
/// must not change during a run; a map replay only reproduces when it is
/// driven by the same initial config.
#[derive(Resource, Deserialize, Serialize, Clone, Debug)]
pub struct InitialConfig {
    // Simulation (deterministic, must not change mid-run)
    pub tick_rate: f64,
    /// Critter speed in cells per second.
    pub critter_speed: f32,
    /// Critters per wave.
    pub wave_size: u32,
    /// Seconds between critter spawns within a wave.
    pub spawn_interval: f32,

    // Grid defaults (used when no map is loaded)
    pub cell_count_x: i32,
    pub cell_count_y: i32,
    /// Native cell edge length used to size the default render rectangle.
    pub pixel_per_cell: f32,

    // Paths
    pub maps_dir: String,
}

/// Runtime configuration that can be hot-reloaded during a session. Nothing
/// here affects determinism: tick rate changes only re-pace the wall-clock
/// schedule, and the debug toggle only adds logging.
#[derive(Deserialize, Serialize, Asset, TypePath, Clone, Debug)]
pub struct GameConfig {
    pub tick_rate: f64,
    /// Log the spawner→target walk after every applied edit command.
    pub debug_log_path: bool,
}

#[derive(Resource)]
pub struct GameConfigHandle(pub Handle<GameConfig>);

pub struct GameConfigPlugin;

impl Plugin for GameConfigPlugin {
    fn build(&self, app: &mut App) {
        // The initial config must exist before any startup system that sizes
        // the grid or the wave state, so it is loaded right here at plugin
        // build time rather than in a Startup system.
        app.insert_resource(load_initial_config());
        app.add_plugins(RonAssetPlugin::<GameConfig>::new(&["game_config.ron"]))
            .add_systems(Startup, setup_runtime_config);
    }
}

/// Load static initial configuration synchronously, falling back to defaults
/// when the file is missing or malformed.
fn load_initial_config() -> InitialConfig {
    let initial_config_path = "assets/initial_config.ron";

    match std::fs::read_to_string(initial_config_path) {
        Ok(contents) => match ron::from_str::<InitialConfig>(&contents) {
            Ok(config) => {
                info!("Loaded initial config from {}", initial_config_path);
                config
            }
            Err(e) => {
                error!("Failed to parse initial config: {}", e);
                error!("Using default InitialConfig");
                InitialConfig::default()
            }
        },
        Err(e) => {
            error!("Failed to read {}: {}", initial_config_path, e);
            error!("Using default InitialConfig");
            InitialConfig::default()
        }
    }
}

/// Load runtime configuration asynchronously (can be hot-reloaded).
fn setup_runtime_config(mut commands: Commands, asset_server: Res<AssetServer>) {
    let handle = asset_server.load("game_config.ron");
    commands.insert_resource(GameConfigHandle(handle));
}

impl Default for InitialConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20.0,
            critter_speed: 2.5,
            wave_size: 10,
            spawn_interval: 1.0,
            cell_count_x: 15,
            cell_count_y: 15,
            pixel_per_cell: 32.0,
            maps_dir: "maps".to_string(),
        }
    }
}
