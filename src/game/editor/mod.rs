mod actions;

pub use actions::{apply_edit_commands, EditCommand};

use bevy::prelude::*;

use crate::game::simulation::SimSet;

/// Plugin for the map-edit command surface.
///
/// Edits apply during play as well as in the editor state — placing a wall
/// mid-wave is the game's tower-placement move, and the grid's recompute
/// keeps every critter routed either way.
pub struct EditorPlugin;

impl Plugin for EditorPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<EditCommand>();
        app.add_systems(FixedUpdate, apply_edit_commands.in_set(SimSet::Input));
    }
}
