//! JSON map persistence.
//!
//! The on-disk format is the engine's sole wire contract:
//!
//! ```json
//! {
//!     "name": "crossing",
//!     "width": 15,
//!     "height": 15,
//!     "start": { "x": 0, "y": 7 },
//!     "end": { "x": 14, "y": 7 },
//!     "walls": [ { "x": 4, "y": 2 } ]
//! }
//! ```
//!
//! Loading rebuilds a grid in order: dimensions, spawner, target, walls,
//! recompute. A load that fails to read or parse returns the error without
//! touching any grid, so the caller keeps its previous state.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

use super::map::GridMap;

/// A cell coordinate as it appears in the map file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRef {
    pub x: i32,
    pub y: i32,
}

/// In-memory form of a persisted map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapFile {
    #[serde(default)]
    pub name: String,
    pub width: i32,
    pub height: i32,
    pub start: CellRef,
    pub end: CellRef,
    #[serde(default)]
    pub walls: Vec<CellRef>,
}

/// Serializes a grid into its file form. Returns `None` when the grid has
/// no spawner or no target; such a grid cannot produce a well-formed file
/// and fails the editor's validity gate anyway.
pub fn to_map_file(map: &GridMap) -> Option<MapFile> {
    let (sx, sy) = map.spawner_cell()?;
    let (tx, ty) = map.target_cell()?;
    let walls = map
        .cells()
        .iter()
        .filter(|cell| cell.wall)
        .map(|cell| CellRef {
            x: cell.x,
            y: cell.y,
        })
        .collect();
    Some(MapFile {
        name: map.name().to_string(),
        width: map.cell_count_x(),
        height: map.cell_count_y(),
        start: CellRef { x: sx, y: sy },
        end: CellRef { x: tx, y: ty },
        walls,
    })
}

impl GridMap {
    /// Clears and rebuilds this grid from a parsed map file, keeping the
    /// subscriber registry so dependents see the change through their
    /// subscriptions. Out-of-bounds roles and walls fall to the setters'
    /// usual silent no-ops.
    pub fn apply_map_file(&mut self, file: &MapFile) {
        self.set_name(file.name.clone());
        self.reinit(file.width, file.height);
        self.set_spawner(file.start.x, file.start.y);
        self.set_target(file.end.x, file.end.y);
        for wall in &file.walls {
            self.set_wall(wall.x, wall.y, true);
        }
        // The setters above recompute, but every one of them may have been a
        // no-op; close with one unconditional recompute so the field and the
        // validity cache always describe the new topology.
        self.recompute();
    }
}

/// Reads and parses a map file, validating its dimensions.
pub fn load_map_file(path: impl AsRef<Path>) -> Result<MapFile, Box<dyn Error>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let mut file: MapFile = serde_json::from_str(&contents)?;
    if file.width <= 0 || file.height <= 0 {
        return Err(format!(
            "map '{}' has invalid dimensions {}x{}",
            path.display(),
            file.width,
            file.height
        )
        .into());
    }
    if file.name.is_empty() {
        file.name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string());
    }
    Ok(file)
}

/// Loads a fresh grid from a map file on disk.
pub fn load_map(path: impl AsRef<Path>) -> Result<GridMap, Box<dyn Error>> {
    let file = load_map_file(&path)?;
    let mut map = GridMap::new(file.width, file.height, file.name.clone());
    map.apply_map_file(&file);
    info!(
        "loaded map '{}' ({}x{}, {} walls)",
        map.name(),
        map.cell_count_x(),
        map.cell_count_y(),
        file.walls.len()
    );
    Ok(map)
}

/// Writes a grid to disk as pretty-printed JSON. The editor checks
/// `is_valid_path` before calling this; the function itself only requires
/// that both roles exist.
pub fn save_map(path: impl AsRef<Path>, map: &GridMap) -> Result<(), Box<dyn Error>> {
    let file = to_map_file(map).ok_or("map has no spawner or target cell")?;
    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(path.as_ref(), json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("redoubt-{}-{name}", std::process::id()))
    }

    #[test]
    fn save_then_load_reproduces_the_grid() {
        let mut map = GridMap::new(9, 7, "disk");
        map.set_target(8, 3);
        map.set_spawner(0, 3);
        map.set_wall(4, 0, true);
        map.set_wall(4, 1, true);

        let path = temp_file("roundtrip.json");
        save_map(&path, &map).expect("save succeeds");
        let loaded = load_map(&path).expect("load succeeds");
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.cell_count_x(), 9);
        assert_eq!(loaded.cell_count_y(), 7);
        assert_eq!(loaded.name(), "disk");
        assert_eq!(loaded.target_cell(), map.target_cell());
        assert_eq!(loaded.spawner_cell(), map.spawner_cell());
        assert!(loaded.is_wall(4, 0) && loaded.is_wall(4, 1));
        assert!(loaded.is_valid_path());
    }

    #[test]
    fn loading_a_missing_file_errors() {
        assert!(load_map(temp_file("does-not-exist.json")).is_err());
    }

    #[test]
    fn loading_rejects_bad_dimensions() {
        let path = temp_file("bad-dims.json");
        std::fs::write(
            &path,
            r#"{ "width": 0, "height": 5, "start": {"x":0,"y":0}, "end": {"x":1,"y":1} }"#,
        )
        .unwrap();
        let result = load_map_file(&path);
        let _ = std::fs::remove_file(&path);
        assert!(result.is_err());
    }

    #[test]
    fn missing_name_falls_back_to_the_file_stem() {
        let path = temp_file("stem-fallback.json");
        std::fs::write(
            &path,
            r#"{ "width": 4, "height": 4, "start": {"x":0,"y":0}, "end": {"x":3,"y":3} }"#,
        )
        .unwrap();
        let file = load_map_file(&path).expect("parses");
        let _ = std::fs::remove_file(&path);
        assert!(file.name.ends_with("stem-fallback"));
        assert!(file.walls.is_empty(), "walls default to empty");
    }
}
