//! Viewport interaction: pointer drag panning, wheel zoom, modifier pan mode,
//! and edge autoscroll.
//!
//! `InteractionController` owns the [`Viewport`] and is the only thing that
//! mutates it in response to input. Every handler returns `true` when the
//! viewport changed, which is the caller's cue to re-run the loaders.
//!
//! Pointer positions arrive in page coordinates together with the canvas
//! [`CanvasRect`]; drag deltas are taken in page space (1:1 with screen
//! pixels, independent of zoom).

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::consts::{BASE_PAN_SPEED, EDGE_SCROLL_MARGIN_PX, ZOOM_STEP};
use crate::viewport::{CanvasRect, Point, Viewport};

/// Kind of device that produced a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerKind {
    #[default]
    Mouse,
    Pen,
    /// Ignored here; touch gestures are handled elsewhere.
    Touch,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Primary,
    Middle,
    Secondary,
}

/// Keyboard modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl or Cmd: the keys that hold pan mode.
    #[must_use]
    pub fn pan_key(self) -> bool {
        self.ctrl || self.meta
    }
}

/// One pointer event in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub page: Point,
    pub button: Button,
    pub kind: PointerKind,
}

impl PointerInput {
    #[must_use]
    pub fn mouse(x: f64, y: f64) -> Self {
        Self { page: Point::new(x, y), button: Button::Primary, kind: PointerKind::Mouse }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Dragging the canvas.
    Panning {
        /// Page-space position of the previous pointer event.
        last_page: Point,
    },
}

/// Cursor the view should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    Default,
    Grab,
    Grabbing,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    viewport: Viewport,
    state: InteractionState,
    pan_mode: bool,
    /// Last known pointer position in page space; `None` until the first move.
    pointer: Option<Point>,
}

impl InteractionController {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport, ..Self::default() }
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Viewport::new(viewport.x, viewport.y, viewport.zoom);
    }

    #[must_use]
    pub fn state(&self) -> InteractionState {
        self.state
    }

    #[must_use]
    pub fn is_pan_mode(&self) -> bool {
        self.pan_mode
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, InteractionState::Panning { .. })
    }

    #[must_use]
    pub fn cursor(&self) -> CursorStyle {
        match (self.state, self.pan_mode) {
            (InteractionState::Panning { .. }, _) => CursorStyle::Grabbing,
            (InteractionState::Idle, true) => CursorStyle::Grab,
            (InteractionState::Idle, false) => CursorStyle::Default,
        }
    }

    // --- Pointer ---

    /// Start a drag on primary press while pan mode is held. Returns `true`
    /// if the event was consumed.
    pub fn on_pointer_down(&mut self, input: PointerInput) -> bool {
        if input.kind == PointerKind::Touch || input.button != Button::Primary || !self.pan_mode {
            return false;
        }
        self.pointer = Some(input.page);
        self.state = InteractionState::Panning { last_page: input.page };
        true
    }

    /// Track the pointer and pan 1:1 while dragging.
    pub fn on_pointer_move(&mut self, input: PointerInput) -> bool {
        if input.kind == PointerKind::Touch {
            return false;
        }
        self.pointer = Some(input.page);
        let InteractionState::Panning { last_page } = self.state else {
            return false;
        };
        self.viewport.pan_by(input.page.x - last_page.x, input.page.y - last_page.y);
        self.state = InteractionState::Panning { last_page: input.page };
        true
    }

    /// End a drag. Returns `true` if a drag was in progress.
    pub fn on_pointer_up(&mut self, input: PointerInput) -> bool {
        if input.kind == PointerKind::Touch || !self.is_dragging() {
            return false;
        }
        self.state = InteractionState::Idle;
        true
    }

    /// Zoom one step toward (`delta_y < 0`) or away from the viewer, keeping
    /// the world point under the cursor fixed.
    pub fn on_wheel(&mut self, delta_y: f64, page: Point, rect: CanvasRect) -> bool {
        let factor = if delta_y < 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
        let before = self.viewport;
        self.viewport.zoom_at(rect.to_local(page), factor);
        self.viewport != before
    }

    // --- Keyboard ---

    /// Enter pan mode when Ctrl/Cmd goes down.
    pub fn on_key_down(&mut self, modifiers: Modifiers) {
        if modifiers.pan_key() {
            self.pan_mode = true;
        }
    }

    /// Leave pan mode when neither Ctrl nor Cmd is held. An active drag
    /// continues until the pointer is released.
    pub fn on_key_up(&mut self, modifiers: Modifiers) {
        if !modifiers.pan_key() {
            self.pan_mode = false;
        }
    }

    // --- Render clock ---

    /// One autoscroll step. Scrolls while pan mode is on, no drag is active,
    /// and the pointer sits within the edge margin of `rect`.
    pub fn tick(&mut self, rect: CanvasRect) -> bool {
        if !self.pan_mode || self.is_dragging() {
            return false;
        }
        let Some(pointer) = self.pointer else {
            return false;
        };
        let (dx, dy) = edge_scroll_delta(pointer, rect, self.viewport.zoom);
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        self.viewport.pan_by(dx, dy);
        true
    }
}

/// Autoscroll delta for a pointer at `pointer` (page space).
///
/// Speed is `BASE_PAN_SPEED / zoom`, scaled by how far into the margin the
/// pointer sits. Near the left/top edge the content moves right/down.
#[must_use]
pub fn edge_scroll_delta(pointer: Point, rect: CanvasRect, zoom: f64) -> (f64, f64) {
    let speed = BASE_PAN_SPEED / zoom;
    let axis = |pos: f64, low: f64, high: f64| {
        if pos < low + EDGE_SCROLL_MARGIN_PX {
            speed * (low + EDGE_SCROLL_MARGIN_PX - pos) / EDGE_SCROLL_MARGIN_PX
        } else if pos > high - EDGE_SCROLL_MARGIN_PX {
            -speed * (pos - (high - EDGE_SCROLL_MARGIN_PX)) / EDGE_SCROLL_MARGIN_PX
        } else {
            0.0
        }
    };
    (axis(pointer.x, rect.left, rect.right()), axis(pointer.y, rect.top, rect.bottom()))
}
