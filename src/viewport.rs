#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

use crate::consts::{CELL_SIZE, MAX_ZOOM, MIN_ZOOM};

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel size of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Page-space bounding rectangle of the canvas element.
///
/// Pointer events arrive in page coordinates; the rect translates them into
/// canvas-local pixels and tells the autoscroll loop where the edges are.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl CanvasRect {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// A rect anchored at the page origin.
    #[must_use]
    pub fn at_origin(size: CanvasSize) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    #[must_use]
    pub fn size(&self) -> CanvasSize {
        CanvasSize::new(self.width, self.height)
    }

    /// Convert a page-space point into canvas-local pixels.
    #[must_use]
    pub fn to_local(&self, page: Point) -> Point {
        Point::new(page.x - self.left, page.y - self.top)
    }
}

/// Axis-aligned rectangle in world pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Camera transform for the infinite grid.
///
/// `x` / `y` are the screen-pixel offset of the world origin relative to the
/// canvas top-left corner. `zoom` is a scale factor (1.0 = one world pixel per
/// screen pixel) kept within [`MIN_ZOOM`, `MAX_ZOOM`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, zoom: 1.0 }
    }
}

/// Clamp a zoom factor into the supported range. Non-finite input maps to 1.0.
#[must_use]
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() { zoom.clamp(MIN_ZOOM, MAX_ZOOM) } else { 1.0 }
}

impl Viewport {
    #[must_use]
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        Self { x, y, zoom: clamp_zoom(zoom) }
    }

    /// Viewport at zoom 1.0 with the world origin in the middle of the canvas.
    #[must_use]
    pub fn centered_on_origin(size: CanvasSize) -> Self {
        Self::new(size.width / 2.0, size.height / 2.0, 1.0)
    }

    /// Viewport at `zoom` with the centre of cell `(row, col)` in the middle of the canvas.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn centered_on_cell(row: i64, col: i64, size: CanvasSize, zoom: f64) -> Self {
        let zoom = clamp_zoom(zoom);
        let center = Point::new(
            (col as f64).mul_add(CELL_SIZE, CELL_SIZE / 2.0),
            (row as f64).mul_add(CELL_SIZE, CELL_SIZE / 2.0),
        );
        Self {
            x: center.x.mul_add(-zoom, size.width / 2.0),
            y: center.y.mul_add(-zoom, size.height / 2.0),
            zoom,
        }
    }

    /// Convert a canvas-local screen point to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.x) / self.zoom,
            y: (screen.y - self.y) / self.zoom,
        }
    }

    /// Convert a world point to canvas-local screen coordinates.
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x.mul_add(self.zoom, self.x),
            y: world.y.mul_add(self.zoom, self.y),
        }
    }

    /// Translate the viewport by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Multiply zoom by `factor` while keeping the world point under `anchor` fixed on screen.
    ///
    /// `anchor` is in canvas-local pixels. The resulting zoom is clamped, and the
    /// offset is solved from the pre-zoom world coordinate under the anchor.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        let world_before = self.screen_to_world(anchor);
        self.zoom = clamp_zoom(self.zoom * factor);
        self.x = world_before.x.mul_add(-self.zoom, anchor.x);
        self.y = world_before.y.mul_add(-self.zoom, anchor.y);
    }

    /// The world rectangle visible through a canvas of `size`.
    #[must_use]
    pub fn visible_world_rect(&self, size: CanvasSize) -> WorldRect {
        let zoom = clamp_zoom(self.zoom);
        let left = -self.x / zoom;
        let top = -self.y / zoom;
        WorldRect {
            left,
            top,
            right: left + size.width / zoom,
            bottom: top + size.height / zoom,
        }
    }
}
