//! `FluxClient`: one object wiring the caches, loaders, realtime channel and
//! transport together.
//!
//! The client is the composition root. It is constructed explicitly (no
//! globals), so tests and embedders can run several isolated instances side
//! by side. The realtime channel is owned here; its lifetime is the client's,
//! not any one view's.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{ClientConfig, ConfigError};
use crate::coords::{CellCoord, FetchChunk, HeatmapChunk};
use crate::fetch::{GridLoader, HeatmapLoader, LoadOutcome, ViewportCounter};
use crate::mapper::viewport_count_range;
use crate::net::api::{ApiError, HttpTransport, Transport};
use crate::net::realtime::{Outbound, RealtimeChannel};
use crate::net::types::{Cell, CreateMessage, MessageDetail};
use crate::state::{FluxStore, Stats, StoreSnapshot};
use crate::viewport::{CanvasSize, Viewport};

/// Error returned while constructing a [`FluxClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Outcome of one viewport change for both loaders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewportLoad {
    pub grid: LoadOutcome<FetchChunk>,
    pub heatmap: LoadOutcome<HeatmapChunk>,
}

pub struct FluxClient {
    transport: Arc<dyn Transport>,
    store: FluxStore,
    grid: GridLoader,
    heatmap: HeatmapLoader,
    counter: ViewportCounter,
    realtime: RealtimeChannel,
}

impl FluxClient {
    /// Build a client over an arbitrary transport.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when no realtime URL can be derived.
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        let store = FluxStore::new();
        let realtime = RealtimeChannel::new(config.realtime_url()?, config.reconnect_delay, store.clone());
        Ok(Self {
            grid: GridLoader::new(Arc::clone(&transport), store.clone(), config.request_throttle),
            heatmap: HeatmapLoader::new(Arc::clone(&transport), store.clone(), config.request_throttle),
            counter: ViewportCounter::new(Arc::clone(&transport), store.clone(), config.viewport_stats_debounce),
            transport,
            store,
            realtime,
        })
    }

    /// Build a client talking HTTP to `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the HTTP client cannot be built or the
    /// realtime URL cannot be derived.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = Arc::new(HttpTransport::new(config)?);
        Ok(Self::new(config, transport)?)
    }

    #[must_use]
    pub fn store(&self) -> &FluxStore {
        &self.store
    }

    #[must_use]
    pub fn realtime(&self) -> &RealtimeChannel {
        &self.realtime
    }

    #[must_use]
    pub fn grid(&self) -> &GridLoader {
        &self.grid
    }

    #[must_use]
    pub fn heatmap(&self) -> &HeatmapLoader {
        &self.heatmap
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    /// Start the realtime connection. Idempotent.
    pub fn connect_realtime(&self) {
        self.realtime.connect();
    }

    /// Stop the realtime connection and any pending viewport-count refresh.
    pub fn shutdown(&self) {
        self.counter.cancel();
        self.realtime.shutdown();
    }

    // --- Viewport ---

    /// Load grid cells and heat values for `viewport` and schedule the
    /// debounced viewport-count refresh.
    pub async fn on_viewport_changed(&self, viewport: &Viewport, size: CanvasSize) -> ViewportLoad {
        self.counter.schedule(viewport_count_range(viewport, size));
        let (grid, heatmap) = tokio::join!(
            self.grid.load_for_viewport(viewport, size),
            self.heatmap.load_for_viewport(viewport, size),
        );
        ViewportLoad { grid, heatmap }
    }

    /// Starting viewport: the server-suggested cell centred in the canvas,
    /// or the world origin centred when the lookup fails.
    pub async fn initial_viewport(&self, size: CanvasSize) -> Viewport {
        match self.transport.initial_position().await {
            Ok(position) => {
                info!(
                    row = position.row_index,
                    col = position.col_index,
                    is_default = position.is_default,
                    "initial position"
                );
                Viewport::centered_on_cell(position.row_index, position.col_index, size, 1.0)
            }
            Err(e) => {
                warn!(error = %e, "initial position lookup failed, centring origin");
                Viewport::centered_on_origin(size)
            }
        }
    }

    // --- Messages ---

    /// Create or update a cell. On success the cell is cached, and a
    /// previously empty coordinate bumps its heatmap chunk by one.
    ///
    /// # Errors
    ///
    /// Returns the transport error unchanged; the cache is left untouched.
    pub async fn create_message(&self, message: &CreateMessage) -> Result<Cell, ApiError> {
        let cell = self.transport.create_message(message).await?;
        if self.store.upsert_cell(cell.clone()) {
            self.store.bump_heat(cell.coord(), 1);
        }
        Ok(cell)
    }

    /// Fetch and store the hover detail for message `id`. A failure clears it.
    pub async fn load_message_detail(&self, id: i64) -> Option<MessageDetail> {
        match self.transport.message_detail(id).await {
            Ok(detail) => {
                self.store.set_hovered(Some(detail.clone()));
                Some(detail)
            }
            Err(e) => {
                warn!(id, error = %e, "message detail fetch failed");
                self.store.set_hovered(None);
                None
            }
        }
    }

    pub fn clear_hovered(&self) {
        self.store.set_hovered(None);
    }

    /// Overwrite the aggregate counters from `GET /api/stats`.
    ///
    /// # Errors
    ///
    /// Returns the transport error; the counters keep their previous values.
    pub async fn refresh_stats(&self) -> Result<Stats, ApiError> {
        let stats = self.transport.stats().await?;
        self.store.apply_stats_response(stats);
        Ok(self.store.stats())
    }

    // --- Presence ---

    /// Announce that this client started editing `cell`. Best effort.
    pub fn begin_editing(&self, cell: CellCoord) -> bool {
        self.realtime.send(&Outbound::UserIsEditing(cell))
    }

    /// Announce that this client stopped editing `cell`. Best effort.
    pub fn end_editing(&self, cell: CellCoord) -> bool {
        self.realtime.send(&Outbound::UserStoppedEditing(cell))
    }
}
