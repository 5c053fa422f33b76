//! Client-side caches shared by the loaders, the realtime channel and the
//! render boundary.
//!
//! DESIGN
//! ======
//! `FluxStore` is a cheap `Clone` handle over one `Mutex`. Every mutation is
//! a short critical section with no `.await` inside, so concurrent fetch
//! completions and realtime pushes interleave at whole-operation
//! granularity. Whichever write lands last for a coordinate wins.
//!
//! Readers never borrow into the store: [`FluxStore::snapshot`] copies the
//! current state into a [`StoreSnapshot`] they own.
//!
//! `revision` increments on every mutation so a renderer can skip redraws
//! when nothing changed.

pub mod cells;
pub mod heatmap;
pub mod locks;
pub mod stats;


use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::coords::{CellCoord, CellRange, HeatmapChunk};
use crate::net::types::{Cell, HeatValue, MessageDetail, StatsResponse, SystemStats};

pub use cells::CellCache;
pub use heatmap::{HeatTier, HeatmapCache};
pub use locks::LockSet;
pub use stats::Stats;

#[derive(Debug, Default)]
struct StoreInner {
    cells: CellCache,
    heatmap: HeatmapCache,
    locks: LockSet,
    stats: Stats,
    hovered: Option<MessageDetail>,
    revision: u64,
}

/// Owned, read-only copy of everything the view layer renders.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub cells: HashMap<CellCoord, Cell>,
    pub heat: HashMap<HeatmapChunk, u32>,
    pub locks: HashSet<CellCoord>,
    pub stats: Stats,
    pub hovered: Option<MessageDetail>,
    pub revision: u64,
}

impl StoreSnapshot {
    #[must_use]
    pub fn heat_tier(&self, chunk: HeatmapChunk) -> Option<HeatTier> {
        self.heat.get(&chunk).copied().and_then(HeatTier::classify)
    }
}

/// Shared handle to the client caches.
#[derive(Debug, Clone, Default)]
pub struct FluxStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl FluxStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut StoreInner) -> R) -> R {
        let mut inner = self.lock();
        let out = f(&mut inner);
        inner.revision = inner.revision.wrapping_add(1);
        out
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        let inner = self.lock();
        StoreSnapshot {
            cells: inner.cells.to_map(),
            heat: inner.heatmap.to_map(),
            locks: inner.locks.to_set(),
            stats: inner.stats,
            hovered: inner.hovered.clone(),
            revision: inner.revision,
        }
    }

    // ── Cells ───────────────────────────────────────────────────

    /// Upsert a cell. Returns `true` if the coordinate was previously empty.
    pub fn upsert_cell(&self, cell: Cell) -> bool {
        self.mutate(|s| s.cells.upsert(cell).is_none())
    }

    pub fn merge_cells(&self, cells: Vec<Cell>) -> usize {
        self.mutate(|s| s.cells.merge(cells))
    }

    pub fn remove_cell(&self, coord: CellCoord) -> Option<Cell> {
        self.mutate(|s| s.cells.remove(coord))
    }

    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<Cell> {
        self.lock().cells.get(coord).cloned()
    }

    #[must_use]
    pub fn cells_in_range(&self, range: CellRange) -> Vec<Cell> {
        self.lock().cells.in_range(range).into_iter().cloned().collect()
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.lock().cells.len()
    }

    // ── Heatmap ─────────────────────────────────────────────────

    pub fn merge_heat(&self, values: &[HeatValue]) {
        self.mutate(|s| s.heatmap.merge(values));
    }

    #[must_use]
    pub fn heat(&self, chunk: HeatmapChunk) -> Option<u32> {
        self.lock().heatmap.get(chunk)
    }

    /// Adjust the heat of the chunk containing `cell`, saturating at 0.
    pub fn bump_heat(&self, cell: CellCoord, increment: i64) -> u32 {
        self.mutate(|s| s.heatmap.bump(cell, increment))
    }

    pub fn clear_heat(&self) {
        self.mutate(|s| s.heatmap.clear());
    }

    // ── Locks ───────────────────────────────────────────────────

    pub fn lock_cell(&self, cell: CellCoord) -> bool {
        self.mutate(|s| s.locks.insert(cell))
    }

    pub fn unlock_cell(&self, cell: CellCoord) -> bool {
        self.mutate(|s| s.locks.remove(cell))
    }

    #[must_use]
    pub fn is_locked(&self, cell: CellCoord) -> bool {
        self.lock().locks.contains(cell)
    }

    // ── Stats ───────────────────────────────────────────────────

    #[must_use]
    pub fn stats(&self) -> Stats {
        self.lock().stats
    }

    pub fn set_online_users(&self, count: u32) {
        self.mutate(|s| s.stats.online_users = count);
    }

    pub fn apply_system_stats(&self, stats: SystemStats) {
        self.mutate(|s| s.stats.apply_system(stats));
    }

    pub fn apply_stats_response(&self, stats: StatsResponse) {
        self.mutate(|s| s.stats.apply_response(stats));
    }

    pub fn set_viewport_message_count(&self, count: u64) {
        self.mutate(|s| s.stats.viewport_message_count = count);
    }

    // ── Hover ───────────────────────────────────────────────────

    #[must_use]
    pub fn hovered(&self) -> Option<MessageDetail> {
        self.lock().hovered.clone()
    }

    pub fn set_hovered(&self, detail: Option<MessageDetail>) {
        self.mutate(|s| s.hovered = detail);
    }
}
