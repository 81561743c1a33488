use bevy::prelude::*;

use crate::game::fixed_math::FixedVec2;
use crate::game::grid::FlowSubscription;

/// Marker for critter entities.
#[derive(Component, Debug)]
pub struct Critter;

/// The critter's flow field subscription. Movement clears its cached
/// waypoint whenever this reports a topology change.
#[derive(Component, Debug)]
pub struct FlowWatcher(pub FlowSubscription);

/// Cell-space point the critter is currently heading for: the center of the
/// neighbor its cell's flow direction names. `None` means "derive on the
/// next step" — freshly spawned, just arrived, or invalidated by an edit.
#[derive(Component, Debug, Default)]
pub struct NextWaypoint(pub Option<FixedVec2>);

/// Written when a critter steps onto the target cell, just before it
/// despawns.
#[derive(Event, Message, Debug, Clone)]
pub struct CritterReachedTarget {
    pub entity: Entity,
}
