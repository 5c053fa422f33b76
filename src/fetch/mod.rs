//! Viewport-driven loading of grid cells and heatmap values.
//!
//! DESIGN
//! ======
//! Each loader owns a [`ChunkLedger`] and a [`Throttle`] behind one `Mutex`.
//! A trigger computes the chunks the viewport needs, then claims the
//! unfetched ones (`Unfetched → Pending`) under the lock *before* any request
//! is sent. A concurrent trigger overlapping the same chunks finds them
//! `Pending` and skips them, so no chunk is ever fetched twice at once.
//!
//! ERROR HANDLING
//! ==============
//! Loader calls never return errors. A failed request is logged, its chunks
//! roll back to `Unfetched` so the next qualifying trigger retries them, and
//! the message lands in `last_error`. A later success clears it.
//!
//! TRADE-OFFS
//! ==========
//! Requests are never cancelled. A response for a chunk that has since
//! scrolled off screen still merges into the cache; cells are keyed by
//! coordinate, so this is stale-but-harmless.

pub mod grid;
pub mod heatmap;
pub mod ledger;
pub mod throttle;
pub mod viewport_counter;

use std::hash::Hash;
use std::time::{Duration, Instant};

pub use grid::GridLoader;
pub use heatmap::HeatmapLoader;
pub use ledger::{ChunkLedger, ChunkStatus};
pub use throttle::Throttle;
pub use viewport_counter::ViewportCounter;

/// Chunks sent in one dispatch and those whose request failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport<K> {
    pub requested: Vec<K>,
    pub failed: Vec<K>,
}

impl<K> FetchReport<K> {
    fn empty() -> Self {
        Self { requested: Vec::new(), failed: Vec::new() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requested.is_empty()
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of a viewport trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome<K> {
    /// Every required chunk is already loaded or in flight.
    NothingNew,
    /// New chunks are needed but the previous trigger was too recent.
    Throttled,
    Requested(FetchReport<K>),
}

impl<K> LoadOutcome<K> {
    #[must_use]
    pub fn report(&self) -> Option<&FetchReport<K>> {
        match self {
            Self::Requested(report) => Some(report),
            Self::NothingNew | Self::Throttled => None,
        }
    }
}

/// Ledger, throttle clock and last error of one loader.
#[derive(Debug)]
pub(crate) struct LoaderState<K> {
    pub(crate) ledger: ChunkLedger<K>,
    pub(crate) throttle: Throttle,
    pub(crate) last_error: Option<String>,
}

/// Outcome of the synchronous half of a viewport trigger.
pub(crate) enum Admission<K> {
    NothingNew,
    Throttled,
    Claimed(Vec<K>),
}

impl<K: Copy + Eq + Hash> LoaderState<K> {
    pub(crate) fn new(throttle: Duration) -> Self {
        Self { ledger: ChunkLedger::new(), throttle: Throttle::new(throttle), last_error: None }
    }

    /// Throttled claim: an empty delta never touches the throttle clock.
    pub(crate) fn admit(&mut self, required: &[K], now: Instant) -> Admission<K> {
        if self.ledger.unfetched(required).is_empty() {
            return Admission::NothingNew;
        }
        if !self.throttle.try_acquire_at(now) {
            return Admission::Throttled;
        }
        Admission::Claimed(self.ledger.claim(required))
    }

    pub(crate) fn finish_ok(&mut self, keys: &[K]) {
        self.ledger.mark_loaded(keys);
        self.last_error = None;
    }

    pub(crate) fn finish_err(&mut self, keys: &[K], message: String) {
        self.ledger.rollback(keys);
        self.last_error = Some(message);
    }
}
