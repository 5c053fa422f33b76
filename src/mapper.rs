//! Viewport → discrete grid mapping.
//!
//! Pure functions: identical inputs always produce identical outputs and
//! nothing outside the arguments is read or written.
//!
//! The visible cell range is `floor(edge / CELL_SIZE)` on both sides, so the
//! end bound is inclusive of any cell the right/bottom edge touches. A
//! partially visible cell is never dropped; at most one extra cell that only
//! touches the edge is included.
//!
//! Indices are clamped to `±MAX_CELL_INDEX`, so a viewport parked far out in
//! `f64` space still maps to a valid, non-overflowing chunk.

#[cfg(test)]
#[path = "mapper_test.rs"]
mod mapper_test;

use crate::consts::{CELL_SIZE, MAX_CELL_INDEX};
use crate::coords::{CellRange, FetchChunk, HeatmapChunk};
use crate::viewport::{CanvasSize, Viewport};

#[allow(clippy::cast_possible_truncation)]
fn cell_index(world: f64) -> i64 {
    ((world / CELL_SIZE).floor() as i64).clamp(-MAX_CELL_INDEX, MAX_CELL_INDEX)
}

/// Inclusive range of cells visible through `size` at `viewport`.
#[must_use]
pub fn visible_cell_range(viewport: &Viewport, size: CanvasSize) -> CellRange {
    let rect = viewport.visible_world_rect(size);
    CellRange::new(
        cell_index(rect.top),
        cell_index(rect.bottom),
        cell_index(rect.left),
        cell_index(rect.right),
    )
}

/// Range sent to the viewport message count. Unlike
/// [`visible_cell_range`], the end bounds round up, so one extra row or
/// column past a partially visible edge is counted.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn viewport_count_range(viewport: &Viewport, size: CanvasSize) -> CellRange {
    let rect = viewport.visible_world_rect(size);
    let ceil = |world: f64| ((world / CELL_SIZE).ceil() as i64).clamp(-MAX_CELL_INDEX, MAX_CELL_INDEX);
    CellRange::new(cell_index(rect.top), ceil(rect.bottom), cell_index(rect.left), ceil(rect.right))
}

/// Fetch chunks intersecting the visible area, row-major.
#[must_use]
pub fn required_fetch_chunks(viewport: &Viewport, size: CanvasSize) -> Vec<FetchChunk> {
    visible_cell_range(viewport, size).fetch_chunks()
}

/// Heatmap chunks intersecting the visible area, ordered by `grid_y` then `grid_x`.
#[must_use]
pub fn required_heatmap_chunks(viewport: &Viewport, size: CanvasSize) -> Vec<HeatmapChunk> {
    visible_cell_range(viewport, size).heatmap_chunks()
}
