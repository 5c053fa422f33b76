//! Grid cell loader: one range request per trigger, covering every newly
//! claimed 10 × 10 fetch chunk.
//!
//! Only cells inside the claimed chunks are merged, so a covering range
//! that crosses a chunk another trigger holds never writes into it.

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{Admission, FetchReport, LoadOutcome, LoaderState};
use crate::coords::{CellRange, FetchChunk};
use crate::mapper::required_fetch_chunks;
use crate::net::api::Transport;
use crate::state::FluxStore;
use crate::viewport::{CanvasSize, Viewport};

pub struct GridLoader {
    transport: Arc<dyn Transport>,
    store: FluxStore,
    state: Mutex<LoaderState<FetchChunk>>,
}

impl GridLoader {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, store: FluxStore, throttle: Duration) -> Self {
        Self { transport, store, state: Mutex::new(LoaderState::new(throttle)) }
    }

    fn state(&self) -> MutexGuard<'_, LoaderState<FetchChunk>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch every chunk of `chunks` not already loaded or in flight.
    /// Not throttled.
    pub async fn request_chunks(&self, chunks: &[FetchChunk]) -> FetchReport<FetchChunk> {
        let claimed = self.state().ledger.claim(chunks);
        self.dispatch(claimed).await
    }

    /// Load the chunks `viewport` needs, subject to the request throttle.
    pub async fn load_for_viewport(&self, viewport: &Viewport, size: CanvasSize) -> LoadOutcome<FetchChunk> {
        self.load_for_viewport_at(viewport, size, Instant::now()).await
    }

    pub async fn load_for_viewport_at(
        &self,
        viewport: &Viewport,
        size: CanvasSize,
        now: Instant,
    ) -> LoadOutcome<FetchChunk> {
        let required = required_fetch_chunks(viewport, size);
        let admission = self.state().admit(&required, now);
        match admission {
            Admission::NothingNew => LoadOutcome::NothingNew,
            Admission::Throttled => {
                debug!(required = required.len(), "grid: trigger throttled");
                LoadOutcome::Throttled
            }
            Admission::Claimed(claimed) => LoadOutcome::Requested(self.dispatch(claimed).await),
        }
    }

    async fn dispatch(&self, claimed: Vec<FetchChunk>) -> FetchReport<FetchChunk> {
        let Some(range) = CellRange::covering(&claimed) else {
            return FetchReport::empty();
        };
        debug!(chunks = claimed.len(), ?range, "grid: fetching chunks");

        match self.transport.cells_in_range(range).await {
            Ok(cells) => {
                let owned: HashSet<FetchChunk> = claimed.iter().copied().collect();
                // The bounding range may span chunks another trigger owns.
                let cells = cells.into_iter().filter(|cell| owned.contains(&cell.coord().fetch_chunk())).collect();
                let merged = self.store.merge_cells(cells);
                debug!(chunks = claimed.len(), merged, "grid: chunks loaded");
                self.state().finish_ok(&claimed);
                FetchReport { requested: claimed, failed: Vec::new() }
            }
            Err(e) => {
                let keys: Vec<String> = claimed.iter().map(FetchChunk::key).collect();
                warn!(chunks = ?keys, error = %e, "grid: fetch failed");
                self.state().finish_err(&claimed, e.to_string());
                FetchReport { failed: claimed.clone(), requested: claimed }
            }
        }
    }

    /// `true` while any grid request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state().ledger.has_pending()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    #[must_use]
    pub fn loaded_chunks(&self) -> usize {
        self.state().ledger.loaded_count()
    }
}
