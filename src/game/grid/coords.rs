//! Mapping between view-space pixels and grid cell indices.
//!
//! The renderer (out of process here, but the contract stands) hands the
//! grid a target rectangle; the grid letterboxes itself into it with a
//! uniform scale and centers the result. Both directions of the mapping
//! operate on that fitted sub-rectangle, which is what makes the round trip
//! exact: `cell_from_position(cell_center(c)) == c` for any in-bounds cell
//! and any view rectangle with positive area.

use bevy::math::{Rect, Vec2};

use super::map::GridMap;

impl GridMap {
    /// The grid's aspect-fitted sub-rectangle of the given view rectangle:
    /// uniform scale, centered, square cells.
    pub fn fitted_rect(&self, view: Rect) -> Rect {
        let scale = (view.width() / self.cell_count_x() as f32)
            .min(view.height() / self.cell_count_y() as f32);
        let size = Vec2::new(
            self.cell_count_x() as f32 * scale,
            self.cell_count_y() as f32 * scale,
        );
        let min = view.min + (view.max - view.min - size) * 0.5;
        Rect::from_corners(min, min + size)
    }

    /// Cell index under a view-space position, or `None` outside the fitted
    /// grid area.
    pub fn cell_from_position(&self, position: Vec2, view: Rect) -> Option<(i32, i32)> {
        let fitted = self.fitted_rect(view);
        let cell_size = fitted.width() / self.cell_count_x() as f32;
        if cell_size <= 0.0 {
            return None;
        }
        let local = (position - fitted.min) / cell_size;
        let (x, y) = (local.x.floor() as i32, local.y.floor() as i32);
        if self.is_inbounds(x, y) {
            Some((x, y))
        } else {
            None
        }
    }

    /// View-space center of a cell for the given view rectangle.
    pub fn cell_center(&self, x: i32, y: i32, view: Rect) -> Vec2 {
        let fitted = self.fitted_rect(view);
        let cell_size = fitted.width() / self.cell_count_x() as f32;
        fitted.min + Vec2::new((x as f32 + 0.5) * cell_size, (y as f32 + 0.5) * cell_size)
    }

    /// Stores the fitted rectangle for the given view so later queries can
    /// reuse it without re-passing the view.
    pub fn set_current_render_rect(&mut self, view: Rect) {
        self.current_render_rect = self.fitted_rect(view);
    }

    pub fn current_render_rect(&self) -> Rect {
        self.current_render_rect
    }

    /// Edge length of one cell in the current render rectangle.
    pub fn pixel_per_cell(&self) -> f32 {
        self.current_render_rect.width() / self.cell_count_x() as f32
    }
}
