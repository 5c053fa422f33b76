//! Heatmap loader: one batched request per trigger.

#[cfg(test)]
#[path = "heatmap_test.rs"]
mod heatmap_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{Admission, FetchReport, LoadOutcome, LoaderState};
use crate::coords::{HeatmapChunk, join_heatmap_keys};
use crate::mapper::required_heatmap_chunks;
use crate::net::api::Transport;
use crate::state::FluxStore;
use crate::viewport::{CanvasSize, Viewport};

pub struct HeatmapLoader {
    transport: Arc<dyn Transport>,
    store: FluxStore,
    state: Mutex<LoaderState<HeatmapChunk>>,
}

impl HeatmapLoader {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, store: FluxStore, throttle: Duration) -> Self {
        Self { transport, store, state: Mutex::new(LoaderState::new(throttle)) }
    }

    fn state(&self) -> MutexGuard<'_, LoaderState<HeatmapChunk>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch every chunk of `chunks` not already loaded or in flight, in a
    /// single request. Not throttled.
    pub async fn request_chunks(&self, chunks: &[HeatmapChunk]) -> FetchReport<HeatmapChunk> {
        let claimed = self.state().ledger.claim(chunks);
        self.dispatch(claimed).await
    }

    pub async fn load_for_viewport(&self, viewport: &Viewport, size: CanvasSize) -> LoadOutcome<HeatmapChunk> {
        self.load_for_viewport_at(viewport, size, Instant::now()).await
    }

    pub async fn load_for_viewport_at(
        &self,
        viewport: &Viewport,
        size: CanvasSize,
        now: Instant,
    ) -> LoadOutcome<HeatmapChunk> {
        let required = required_heatmap_chunks(viewport, size);
        let admission = self.state().admit(&required, now);
        match admission {
            Admission::NothingNew => LoadOutcome::NothingNew,
            Admission::Throttled => {
                debug!(required = required.len(), "heatmap: trigger throttled");
                LoadOutcome::Throttled
            }
            Admission::Claimed(claimed) => LoadOutcome::Requested(self.dispatch(claimed).await),
        }
    }

    async fn dispatch(&self, claimed: Vec<HeatmapChunk>) -> FetchReport<HeatmapChunk> {
        if claimed.is_empty() {
            return FetchReport::empty();
        }
        match self.transport.heatmap_chunks(&claimed).await {
            Ok(response) => {
                // Chunks absent from the response have no activity; they
                // still count as loaded.
                self.store.merge_heat(&response.data);
                debug!(
                    chunks = claimed.len(),
                    returned = response.data.len(),
                    chunk_size = response.chunk_size,
                    "heatmap: chunks loaded"
                );
                self.state().finish_ok(&claimed);
                FetchReport { requested: claimed, failed: Vec::new() }
            }
            Err(e) => {
                warn!(chunks = %join_heatmap_keys(&claimed), error = %e, "heatmap: fetch failed");
                self.state().finish_err(&claimed, e.to_string());
                FetchReport { failed: claimed.clone(), requested: claimed }
            }
        }
    }

    /// Drop all heat values and forget which chunks were loaded.
    pub fn clear(&self) {
        let mut state = self.state();
        state.ledger.clear();
        state.throttle.reset();
        state.last_error = None;
        drop(state);
        self.store.clear_heat();
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state().ledger.has_pending()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }
}
