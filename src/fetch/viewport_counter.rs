//! Debounced refresh of the viewport-scoped message count.

#[cfg(test)]
#[path = "viewport_counter_test.rs"]
mod viewport_counter_test;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::coords::CellRange;
use crate::net::api::Transport;
use crate::state::FluxStore;

/// Each [`schedule`](Self::schedule) call replaces the pending one, so the
/// request only goes out once the viewport has been still for `debounce`.
/// A request already on the wire is left to finish.
pub struct ViewportCounter {
    transport: Arc<dyn Transport>,
    store: FluxStore,
    debounce: Duration,
    pending: Mutex<Option<Pending>>,
}

struct Pending {
    task: JoinHandle<()>,
    /// Set once the debounce has elapsed and the request is dispatched.
    fired: Arc<AtomicBool>,
}

impl ViewportCounter {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, store: FluxStore, debounce: Duration) -> Self {
        Self { transport, store, debounce, pending: Mutex::new(None) }
    }

    /// Refresh the count for `range` after the debounce period.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, range: CellRange) {
        let transport = Arc::clone(&self.transport);
        let store = self.store.clone();
        let debounce = self.debounce;
        let fired = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn({
            let fired = Arc::clone(&fired);
            async move {
                tokio::time::sleep(debounce).await;
                fired.store(true, Ordering::SeqCst);
                refresh_into(transport.as_ref(), &store, range).await;
            }
        });
        let previous = self.pending.lock().unwrap_or_else(PoisonError::into_inner).replace(Pending { task, fired });
        if let Some(previous) = previous.filter(|p| !p.fired.load(Ordering::SeqCst)) {
            previous.task.abort();
        }
    }

    /// Refresh immediately, bypassing the debounce. Returns the stored count.
    pub async fn refresh(&self, range: CellRange) -> u64 {
        refresh_into(self.transport.as_ref(), &self.store, range).await
    }

    /// Drop the latest refresh, in flight or not.
    pub fn cancel(&self) {
        if let Some(pending) = self.pending.lock().unwrap_or_else(PoisonError::into_inner).take() {
            pending.task.abort();
        }
    }
}

impl Drop for ViewportCounter {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn refresh_into(transport: &dyn Transport, store: &FluxStore, range: CellRange) -> u64 {
    let count = match transport.viewport_message_count(range).await {
        Ok(count) => {
            debug!(count, "viewport count refreshed");
            count
        }
        Err(e) => {
            warn!(error = %e, "viewport count fetch failed");
            0
        }
    };
    store.set_viewport_message_count(count);
    count
}
