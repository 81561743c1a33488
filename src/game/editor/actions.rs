use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::game::config::{GameConfig, GameConfigHandle};
use crate::game::grid::{load_map_file, save_map, GridMap};

/// One best-effort map edit. Every variant funnels through the grid's own
/// setters, which silently ignore out-of-bounds or conflicting-role
/// requests; the UI driving this surface does not need to pre-validate.
#[derive(Event, Message, Debug, Clone)]
pub enum EditCommand {
    SetWall { x: i32, y: i32, wall: bool },
    SetTarget { x: i32, y: i32 },
    SetSpawner { x: i32, y: i32 },
    Resize { width: i32, height: i32 },
    /// Scatter up to `count` random walls; reproducible for a given seed.
    GenerateWalls { count: u32, seed: u64 },
    Save { path: String },
    Load { path: String },
}

/// Drains queued edit commands into grid mutations, in order. Saving is the
/// one hard gate: a map without a valid spawner→target route is refused.
pub fn apply_edit_commands(
    mut map: ResMut<GridMap>,
    mut edits: MessageReader<EditCommand>,
    config_handle: Option<Res<GameConfigHandle>>,
    game_configs: Res<Assets<GameConfig>>,
) {
    let mut applied = 0usize;
    for edit in edits.read() {
        debug!("edit: {:?}", edit);
        match edit {
            EditCommand::SetWall { x, y, wall } => map.set_wall(*x, *y, *wall),
            EditCommand::SetTarget { x, y } => map.set_target(*x, *y),
            EditCommand::SetSpawner { x, y } => map.set_spawner(*x, *y),
            EditCommand::Resize { width, height } => map.resize(*width, *height),
            EditCommand::GenerateWalls { count, seed } => generate_walls(&mut map, *count, *seed),
            EditCommand::Save { path } => save(&map, path),
            EditCommand::Load { path } => load(&mut map, path),
        }
        applied += 1;
    }

    if applied > 0 {
        let log_path = config_handle
            .and_then(|handle| game_configs.get(&handle.0))
            .is_some_and(|config| config.debug_log_path);
        if log_path {
            let path = map.walk_path();
            info!(
                "applied {applied} edits; route is {} cells, valid path: {}",
                path.len(),
                map.is_valid_path()
            );
        }
    }
}

fn generate_walls(map: &mut GridMap, count: u32, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..count {
        let x = rng.random_range(0..map.cell_count_x());
        let y = rng.random_range(0..map.cell_count_y());
        // The grid skips spawner/target cells itself, so collisions with a
        // role just produce fewer walls than requested.
        map.set_wall(x, y, true);
    }
    info!("generated walls from seed {seed}, valid path: {}", map.is_valid_path());
}

fn save(map: &GridMap, path: &str) {
    if !map.is_valid_path() {
        warn!("refusing to save '{path}': no valid spawner→target route");
        return;
    }
    match save_map(path, map) {
        Ok(()) => info!("saved map '{}' to '{path}'", map.name()),
        Err(err) => error!("failed to save '{path}': {err}"),
    }
}

fn load(map: &mut GridMap, path: &str) {
    match load_map_file(path) {
        Ok(file) => {
            map.apply_map_file(&file);
            info!(
                "loaded map '{}' ({}x{}), valid path: {}",
                map.name(),
                map.cell_count_x(),
                map.cell_count_y(),
                map.is_valid_path()
            );
        }
        Err(err) => {
            // Failed loads leave the previous grid untouched.
            error!("failed to load '{path}': {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_set(map: &GridMap) -> Vec<(i32, i32)> {
        let mut walls: Vec<(i32, i32)> = map
            .cells()
            .iter()
            .filter(|c| c.wall)
            .map(|c| (c.x, c.y))
            .collect();
        walls.sort_unstable();
        walls
    }

    #[test]
    fn generated_walls_are_reproducible_for_a_seed() {
        let build = || {
            let mut map = GridMap::new(12, 12, "generated");
            map.set_spawner(0, 0);
            generate_walls(&mut map, 40, 0xfeed);
            map
        };
        let first = build();
        let second = build();
        assert_eq!(wall_set(&first), wall_set(&second));
        assert!(!wall_set(&first).is_empty());
    }

    #[test]
    fn generated_walls_never_land_on_roles() {
        let mut map = GridMap::new(8, 8, "generated");
        map.set_spawner(0, 0);
        let (tx, ty) = map.target_cell().unwrap();
        // Enough attempts to hit every cell with high probability; the role
        // cells must survive regardless.
        generate_walls(&mut map, 500, 7);
        assert!(map.is_spawner(0, 0));
        assert!(map.is_target(tx, ty));
        assert!(!map.is_wall(0, 0));
        assert!(!map.is_wall(tx, ty));
    }
}
