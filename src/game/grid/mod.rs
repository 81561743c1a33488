mod coords;
mod map;
mod map_store;
mod observers;
mod persist;


// ============================================================================
// PUBLIC API
// ============================================================================

pub use map::{Cell, FlowDirection, GridMap, UNREACHABLE};
pub use map_store::MapStore;
pub use observers::FlowSubscription;
pub use persist::{load_map, load_map_file, save_map, to_map_file, CellRef, MapFile};

use bevy::prelude::*;
use std::path::{Path, PathBuf};

use crate::game::config::InitialConfig;
use crate::game::RequestedMap;

/// Plugin owning the grid map resource: scans the maps directory and
/// installs either the requested map or a blank grid sized from config.
pub struct GridPlugin;

impl Plugin for GridPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, init_grid);
    }
}

fn init_grid(mut commands: Commands, config: Res<InitialConfig>, requested: Res<RequestedMap>) {
    let store = MapStore::scan(&config.maps_dir);

    let mut map = match &requested.0 {
        Some(request) => match resolve_request(&store, request) {
            Some(path) => match persist::load_map(&path) {
                Ok(map) => map,
                Err(err) => {
                    error!("failed to load map '{request}': {err}; starting with a blank grid");
                    blank_grid(&config)
                }
            },
            None => {
                error!("no map named '{request}' found; starting with a blank grid");
                blank_grid(&config)
            }
        },
        None => blank_grid(&config),
    };

    map.set_current_render_rect(Rect::new(
        0.0,
        0.0,
        map.cell_count_x() as f32 * config.pixel_per_cell,
        map.cell_count_y() as f32 * config.pixel_per_cell,
    ));
    info!(
        "grid ready: '{}' {}x{}, valid path: {}",
        map.name(),
        map.cell_count_x(),
        map.cell_count_y(),
        map.is_valid_path()
    );

    commands.insert_resource(map);
    commands.insert_resource(store);
}

/// A request is either a path to a map file or the name of an indexed map.
fn resolve_request(store: &MapStore, request: &str) -> Option<PathBuf> {
    let direct = Path::new(request);
    if direct.is_file() {
        return Some(direct.to_path_buf());
    }
    store.get(request).cloned()
}

fn blank_grid(config: &InitialConfig) -> GridMap {
    GridMap::new(config.cell_count_x, config.cell_count_y, "untitled")
}
