//! Name → path index of the maps directory.
//!
//! The map-select flow and the demo binary refer to maps by name; this store
//! scans a directory once and resolves names to files. Unparseable files are
//! skipped with a warning rather than failing the scan.

use bevy::prelude::*;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

use super::persist::load_map_file;

#[derive(Resource, Debug, Default)]
pub struct MapStore {
    maps: FxHashMap<String, PathBuf>,
}

impl MapStore {
    /// Indexes every `*.json` map under `dir` by its `name` field (file stem
    /// when the field is absent). A missing directory yields an empty store.
    pub fn scan(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let mut maps = FxHashMap::default();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("maps directory '{}' not readable: {err}", dir.display());
                return Self::default();
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match load_map_file(&path) {
                Ok(file) => {
                    if let Some(previous) = maps.insert(file.name.clone(), path.clone()) {
                        warn!(
                            "map name '{}' appears in both '{}' and '{}'; keeping the latter",
                            file.name,
                            previous.display(),
                            path.display()
                        );
                    }
                }
                Err(err) => {
                    warn!("skipping map file '{}': {err}", path.display());
                }
            }
        }
        info!("indexed {} maps under '{}'", maps.len(), dir.display());
        Self { maps }
    }

    pub fn get(&self, name: &str) -> Option<&PathBuf> {
        self.maps.get(name)
    }

    /// Known map names, sorted for stable listings.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.maps.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP_A: &str =
        r#"{ "name": "alpha", "width": 4, "height": 4, "start": {"x":0,"y":0}, "end": {"x":3,"y":3} }"#;
    const MAP_B: &str =
        r#"{ "width": 5, "height": 5, "start": {"x":0,"y":0}, "end": {"x":4,"y":4} }"#;

    fn temp_maps_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("redoubt-store-{}-{tag}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn scan_indexes_by_name_and_skips_garbage() {
        let dir = temp_maps_dir("scan");
        std::fs::write(dir.join("first.json"), MAP_A).unwrap();
        std::fs::write(dir.join("beta.json"), MAP_B).unwrap();
        std::fs::write(dir.join("broken.json"), "{ nope").unwrap();
        std::fs::write(dir.join("notes.txt"), "not a map").unwrap();

        let store = MapStore::scan(&dir);
        let _ = std::fs::remove_dir_all(&dir);

        assert_eq!(store.len(), 2);
        // "alpha" comes from the name field, "beta" from the file stem.
        assert_eq!(store.names(), vec!["alpha", "beta"]);
        assert!(store.get("alpha").is_some());
        assert!(store.get("broken").is_none());
    }

    #[test]
    fn scanning_a_missing_directory_yields_an_empty_store() {
        let store = MapStore::scan("/definitely/not/a/real/maps/dir");
        assert!(store.is_empty());
    }
}
