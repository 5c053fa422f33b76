//! Shared numeric constants for the Flux client.

use std::time::Duration;

// ── Grid ────────────────────────────────────────────────────────

/// Edge length of one grid cell in world pixels.
pub const CELL_SIZE: f64 = 150.0;

/// Cells per side of a fetch chunk (10 × 10 cells per grid request).
pub const FETCH_CHUNK_CELLS: i64 = 10;

/// Cells per side of a heatmap chunk (9 × 9 cells per heat value).
pub const HEATMAP_CHUNK_CELLS: i64 = 9;

/// Largest cell index (either sign) a viewport maps to. Leaves room for a
/// whole chunk past it without overflowing `i64`.
pub const MAX_CELL_INDEX: i64 = i64::MAX - FETCH_CHUNK_CELLS;

// ── Camera ──────────────────────────────────────────────────────

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 4.0;

/// Multiplicative zoom applied per wheel tick.
pub const ZOOM_STEP: f64 = 1.1;

// ── Edge autoscroll ─────────────────────────────────────────────

/// Width of the band along each canvas edge that triggers autoscroll, in screen pixels.
pub const EDGE_SCROLL_MARGIN_PX: f64 = 50.0;

/// Autoscroll speed at zoom 1.0 with the pointer on the very edge, in pixels per tick.
pub const BASE_PAN_SPEED: f64 = 7.5;

// ── Timing ──────────────────────────────────────────────────────

/// Minimum spacing between two viewport-triggered fetches.
pub const REQUEST_THROTTLE: Duration = Duration::from_millis(1000);

/// Delay before reconnecting after an abnormal socket close.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Quiet period after the last viewport change before the viewport count is fetched.
pub const VIEWPORT_STATS_DEBOUNCE: Duration = Duration::from_millis(500);

// ── Heat tiers ──────────────────────────────────────────────────

/// Lowest heat value classified as hot.
pub const HEAT_HOT_THRESHOLD: u32 = 51;

/// Lowest heat value classified as warm.
pub const HEAT_WARM_THRESHOLD: u32 = 21;
