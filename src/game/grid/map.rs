use bevy::math::Rect;
use bevy::prelude::*;
use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::observers::{FlowFieldSubscribers, FlowSubscription};
use crate::profile_log;

/// Sentinel distance for cells with no wall-free route to a target.
pub const UNREACHABLE: u16 = u16::MAX;

/// Flow direction of a cell, restricted to the four axis-aligned unit
/// offsets plus "no direction" (unreached cells and the target itself).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowDirection {
    #[default]
    None,
    Left,
    Right,
    Up,
    Down,
}

impl FlowDirection {
    /// Neighbor scan order used by both BFS propagation and direction
    /// derivation. Direction ties resolve to the first-scanned candidate, so
    /// this order is part of the engine's observable behavior and must not
    /// change.
    pub const SCAN_ORDER: [FlowDirection; 4] = [
        FlowDirection::Left,
        FlowDirection::Down,
        FlowDirection::Right,
        FlowDirection::Up,
    ];

    /// Cell-space offset of this direction. `Up` is negative y: the grid is
    /// row-major with y growing downward, matching the map file format.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            FlowDirection::None => (0, 0),
            FlowDirection::Left => (-1, 0),
            FlowDirection::Right => (1, 0),
            FlowDirection::Up => (0, -1),
            FlowDirection::Down => (0, 1),
        }
    }

    /// Unit vector for this direction (zero for `None`). Axis-aligned
    /// offsets are already unit length, so no normalization step is needed.
    pub fn normal(self) -> Vec2 {
        let (dx, dy) = self.offset();
        Vec2::new(dx as f32, dy as f32)
    }
}

/// One grid position.
///
/// Role flags are mutually exclusive with `wall`: the mutators on
/// [`GridMap`] never leave a cell both wall and spawner/target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    pub wall: bool,
    pub spawner: bool,
    pub target: bool,
    pub distance: u16,
    pub flow: FlowDirection,
}

impl Cell {
    fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            wall: false,
            spawner: false,
            target: false,
            distance: UNREACHABLE,
            flow: FlowDirection::None,
        }
    }
}

/// Grid map and flow field engine.
///
/// Owns a row-major rectangle of [`Cell`]s and keeps a flow field over them:
/// for every traversable cell, the direction of shortest travel toward the
/// target cell. Every mutation that changes walkability or a role flag
/// recomputes the field before returning, so readers never observe a stale
/// or partial field.
///
/// # Algorithm
///
/// 1. **Distance field:** multi-source BFS seeded from every target cell at
///    distance 0, four-neighborhood, walls excluded. Cells the search never
///    reaches keep [`UNREACHABLE`].
/// 2. **Direction field:** each finite-distance cell points at its
///    strictly-closest neighbor, scanning left, down, right, up. The target
///    (and any cell with no improving neighbor) keeps no direction.
///
/// One field serves every critter on the map; agents do no search of their
/// own. Recomputation is O(cells) and runs synchronously inside each
/// mutator, which is cheap enough to do on every editor keystroke at the
/// map sizes this game uses.
///
/// # Failure semantics
///
/// Queries return safe defaults for out-of-bounds coordinates and mutators
/// silently ignore invalid requests (out of bounds, conflicting role). The
/// only hard gate is [`GridMap::is_valid_path`], checked by the editor at
/// save time and by wave spawning.
#[derive(Resource, Debug, Clone)]
pub struct GridMap {
    cell_count_x: i32,
    cell_count_y: i32,
    cells: Vec<Cell>,
    name: String,
    valid_path: bool,
    pub(super) current_render_rect: Rect,
    subscribers: FlowFieldSubscribers,
}

impl Default for GridMap {
    fn default() -> Self {
        Self::new(15, 15, "untitled")
    }
}

impl GridMap {
    /// Creates a grid of the given dimensions with the target at the center
    /// and computes the initial flow field. Dimensions are clamped to at
    /// least one cell.
    pub fn new(cell_count_x: i32, cell_count_y: i32, name: impl Into<String>) -> Self {
        let cell_count_x = cell_count_x.max(1);
        let cell_count_y = cell_count_y.max(1);
        let mut map = Self {
            cell_count_x,
            cell_count_y,
            cells: Self::blank_cells(cell_count_x, cell_count_y),
            name: name.into(),
            valid_path: false,
            current_render_rect: Rect::default(),
            subscribers: FlowFieldSubscribers::default(),
        };
        map.set_target(cell_count_x / 2, cell_count_y / 2);
        map
    }

    fn blank_cells(cell_count_x: i32, cell_count_y: i32) -> Vec<Cell> {
        let mut cells = Vec::with_capacity((cell_count_x * cell_count_y) as usize);
        for y in 0..cell_count_y {
            for x in 0..cell_count_x {
                cells.push(Cell::new(x, y));
            }
        }
        cells
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (x + y * self.cell_count_x) as usize
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn cell_count_x(&self) -> i32 {
        self.cell_count_x
    }

    pub fn cell_count_y(&self) -> i32 {
        self.cell_count_y
    }

    /// Read-only view of the cell array, row-major. External code must
    /// funnel all mutation through the setters so the recompute-then-notify
    /// invariant holds.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_inbounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.cell_count_x && y >= 0 && y < self.cell_count_y
    }

    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.is_inbounds(x, y) && self.cells[self.index(x, y)].wall
    }

    pub fn is_spawner(&self, x: i32, y: i32) -> bool {
        self.is_inbounds(x, y) && self.cells[self.index(x, y)].spawner
    }

    pub fn is_target(&self, x: i32, y: i32) -> bool {
        self.is_inbounds(x, y) && self.cells[self.index(x, y)].target
    }

    /// BFS distance from the cell to the target, [`UNREACHABLE`] when no
    /// route exists or the coordinates are out of bounds.
    pub fn distance(&self, x: i32, y: i32) -> u16 {
        if self.is_inbounds(x, y) {
            self.cells[self.index(x, y)].distance
        } else {
            UNREACHABLE
        }
    }

    pub fn flow_dir(&self, x: i32, y: i32) -> FlowDirection {
        if self.is_inbounds(x, y) {
            self.cells[self.index(x, y)].flow
        } else {
            FlowDirection::None
        }
    }

    /// Normalized flow direction for the cell; zero vector out of bounds or
    /// when the cell has no outgoing direction. Callers use this to advance
    /// agents.
    pub fn flow_normal(&self, x: i32, y: i32) -> Vec2 {
        self.flow_dir(x, y).normal()
    }

    pub fn target_cell(&self) -> Option<(i32, i32)> {
        self.cells.iter().find(|c| c.target).map(|c| (c.x, c.y))
    }

    pub fn spawner_cell(&self) -> Option<(i32, i32)> {
        self.cells.iter().find(|c| c.spawner).map(|c| (c.x, c.y))
    }

    /// True iff a spawner exists and has a wall-free route to the target.
    /// Cached by the last recompute; this is the gate the editor save flow
    /// and the wave-start flow must check.
    pub fn is_valid_path(&self) -> bool {
        self.valid_path
    }

    // ========================================================================
    // Mutators — each one recomputes the flow field before returning
    // ========================================================================

    /// Sets or clears a wall. No-op out of bounds or on a spawner/target
    /// cell.
    pub fn set_wall(&mut self, x: i32, y: i32, wall: bool) {
        if !self.is_inbounds(x, y) || self.is_target(x, y) || self.is_spawner(x, y) {
            return;
        }
        let index = self.index(x, y);
        self.cells[index].wall = wall;
        self.recompute();
    }

    /// Moves the target to the given cell, clearing it from everywhere else.
    /// The designated cell loses any wall or spawner flag. No-op out of
    /// bounds.
    pub fn set_target(&mut self, x: i32, y: i32) {
        if !self.is_inbounds(x, y) {
            return;
        }
        for cell in &mut self.cells {
            cell.target = false;
        }
        let index = self.index(x, y);
        self.cells[index].target = true;
        self.cells[index].wall = false;
        self.cells[index].spawner = false;
        self.recompute();
    }

    /// Moves the spawner to the given cell, clearing it from everywhere
    /// else. The designated cell loses any wall flag. No-op out of bounds or
    /// on the target cell.
    pub fn set_spawner(&mut self, x: i32, y: i32) {
        if !self.is_inbounds(x, y) || self.is_target(x, y) {
            return;
        }
        for cell in &mut self.cells {
            cell.spawner = false;
        }
        let index = self.index(x, y);
        self.cells[index].spawner = true;
        self.cells[index].wall = false;
        self.recompute();
    }

    /// Reallocates the grid to the new dimensions. Cells inside both the old
    /// and new bounds keep their flags; new cells start empty. A target or
    /// spawner that falls outside the new bounds is cleared (not clamped)
    /// and must be reassigned by the user. No-op for non-positive
    /// dimensions.
    pub fn resize(&mut self, new_count_x: i32, new_count_y: i32) {
        if new_count_x <= 0 || new_count_y <= 0 {
            warn!(
                "ignoring resize to {}x{}: dimensions must be positive",
                new_count_x, new_count_y
            );
            return;
        }

        let lost_target = self
            .target_cell()
            .filter(|&(x, y)| x >= new_count_x || y >= new_count_y);
        let lost_spawner = self
            .spawner_cell()
            .filter(|&(x, y)| x >= new_count_x || y >= new_count_y);

        let mut cells = Self::blank_cells(new_count_x, new_count_y);
        for y in 0..new_count_y.min(self.cell_count_y) {
            for x in 0..new_count_x.min(self.cell_count_x) {
                let old = self.cells[self.index(x, y)];
                let new_index = (x + y * new_count_x) as usize;
                cells[new_index].wall = old.wall;
                cells[new_index].spawner = old.spawner;
                cells[new_index].target = old.target;
            }
        }
        self.cells = cells;
        self.cell_count_x = new_count_x;
        self.cell_count_y = new_count_y;
        self.current_render_rect = Rect::default();

        if let Some((x, y)) = lost_target {
            warn!("resize dropped the target at ({x}, {y}); reassign it before saving");
        }
        if let Some((x, y)) = lost_spawner {
            warn!("resize dropped the spawner at ({x}, {y}); reassign it before saving");
        }

        self.recompute();
    }

    /// Replaces the cell array with blank cells at the given dimensions
    /// without recomputing. Only the map loader uses this; it follows up
    /// with role/wall setters and a final recompute.
    pub(super) fn reinit(&mut self, cell_count_x: i32, cell_count_y: i32) {
        self.cell_count_x = cell_count_x.max(1);
        self.cell_count_y = cell_count_y.max(1);
        self.cells = Self::blank_cells(self.cell_count_x, self.cell_count_y);
        self.current_render_rect = Rect::default();
    }

    // ========================================================================
    // Flow field recomputation
    // ========================================================================

    /// Resets and recomputes the distance and direction fields, refreshes
    /// the path-validity cache, and marks every live subscription changed.
    pub(super) fn recompute(&mut self) {
        #[cfg(feature = "perf_stats")]
        let started = std::time::Instant::now();

        for cell in &mut self.cells {
            cell.distance = UNREACHABLE;
            cell.flow = FlowDirection::None;
        }
        self.compute_distances();
        self.compute_directions();

        self.valid_path = match self.spawner_cell() {
            Some((x, y)) => self.distance(x, y) != UNREACHABLE,
            None => false,
        };

        profile_log!(
            "flow field recompute: {} cells in {:?}",
            self.cells.len(),
            started.elapsed()
        );

        self.subscribers.notify_all();
    }

    /// Multi-source BFS from every target cell. Tolerates zero targets (all
    /// distances stay UNREACHABLE) and multiple targets (nearest wins)
    /// without special cases.
    fn compute_distances(&mut self) {
        let mut queue = VecDeque::new();
        for index in 0..self.cells.len() {
            if self.cells[index].target {
                self.cells[index].distance = 0;
                queue.push_back(index);
            }
        }

        while let Some(index) = queue.pop_front() {
            let (x, y, dist) = {
                let cell = &self.cells[index];
                (cell.x, cell.y, cell.distance)
            };
            // Keep the increment clear of the sentinel on absurdly large maps.
            if dist >= UNREACHABLE - 1 {
                continue;
            }
            for dir in FlowDirection::SCAN_ORDER {
                let (dx, dy) = dir.offset();
                let (nx, ny) = (x + dx, y + dy);
                if !self.is_inbounds(nx, ny) {
                    continue;
                }
                let neighbor = self.index(nx, ny);
                if self.cells[neighbor].wall || self.cells[neighbor].distance != UNREACHABLE {
                    continue;
                }
                self.cells[neighbor].distance = dist + 1;
                queue.push_back(neighbor);
            }
        }
    }

    /// Points every reached cell at its strictly-closest neighbor. Walls and
    /// unreached cells keep UNREACHABLE distances and therefore never win a
    /// comparison.
    fn compute_directions(&mut self) {
        for index in 0..self.cells.len() {
            if self.cells[index].distance == UNREACHABLE {
                continue;
            }
            let (x, y) = (self.cells[index].x, self.cells[index].y);
            let mut best = self.cells[index].distance;
            let mut flow = FlowDirection::None;
            for dir in FlowDirection::SCAN_ORDER {
                let (dx, dy) = dir.offset();
                let (nx, ny) = (x + dx, y + dy);
                if !self.is_inbounds(nx, ny) {
                    continue;
                }
                let neighbor_dist = self.cells[self.index(nx, ny)].distance;
                if neighbor_dist < best {
                    best = neighbor_dist;
                    flow = dir;
                }
            }
            self.cells[index].flow = flow;
        }
    }

    /// Walks the flow directions from the spawner and returns the traversed
    /// cells, ending at the target for a valid field. Used by the editor for
    /// route preview/logging. Returns an empty path without a spawner; stops
    /// early if the field is broken (no direction, or a step into an
    /// unreached cell). A visited set guards against direction cycles so a
    /// corrupt field cannot hang the walk.
    pub fn walk_path(&self) -> Vec<(i32, i32)> {
        let Some((mut x, mut y)) = self.spawner_cell() else {
            return Vec::new();
        };
        let mut visited = FixedBitSet::with_capacity(self.cells.len());
        let mut path = Vec::new();
        loop {
            let index = self.index(x, y);
            if visited.contains(index) {
                break;
            }
            visited.insert(index);
            path.push((x, y));

            let cell = &self.cells[index];
            if cell.target {
                break;
            }
            let (dx, dy) = cell.flow.offset();
            if dx == 0 && dy == 0 {
                break;
            }
            let (nx, ny) = (x + dx, y + dy);
            if !self.is_inbounds(nx, ny) || self.distance(nx, ny) == UNREACHABLE {
                break;
            }
            x = nx;
            y = ny;
        }
        path
    }

    // ========================================================================
    // Observer hook
    // ========================================================================

    /// Registers a flow field subscription. The returned token is marked
    /// changed at the end of every recompute until taken.
    pub fn subscribe(&mut self) -> FlowSubscription {
        self.subscribers.subscribe()
    }

    /// Releases a subscription slot. Stale tokens are ignored.
    pub fn unsubscribe(&mut self, subscription: FlowSubscription) {
        self.subscribers.unsubscribe(subscription);
    }

    /// Reads and clears the changed flag for a subscription. Returns false
    /// for stale tokens.
    pub fn take_changed(&mut self, subscription: FlowSubscription) -> bool {
        self.subscribers.take_changed(subscription)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.live_count()
    }
}
