//! In-memory [`Transport`] used by unit tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use tokio::sync::Semaphore;

use crate::coords::{CellCoord, CellRange, FetchChunk, HeatmapChunk};
use crate::net::api::{ApiError, Transport};
use crate::net::types::{
    Cell, CreateMessage, HeatValue, HeatmapResponse, InitialPosition, MessageDetail, StatsResponse,
};

#[must_use]
pub fn cell(id: i64, row: i64, col: i64, content: &str) -> Cell {
    Cell {
        id,
        row_index: row,
        col_index: col,
        content: Some(content.to_owned()),
        bg_color: None,
    }
}

/// Server stand-in with failure switches, call logs and an optional gate
/// that holds cell, heatmap and viewport-count requests until permits are
/// added.
#[derive(Default)]
pub struct FakeTransport {
    pub cells: Mutex<BTreeMap<CellCoord, Cell>>,
    pub heat: Mutex<Vec<HeatValue>>,
    pub failing_chunks: Mutex<HashSet<FetchChunk>>,
    pub fail_heatmap: AtomicBool,
    pub fail_viewport_count: AtomicBool,
    pub initial: Mutex<Option<InitialPosition>>,
    pub cell_calls: Mutex<Vec<CellRange>>,
    pub heatmap_calls: Mutex<Vec<Vec<HeatmapChunk>>>,
    pub viewport_calls: AtomicUsize,
    pub next_id: AtomicU64,
    pub gate: Option<Semaphore>,
}

impl FakeTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Data requests block until `release` is called.
    #[must_use]
    pub fn gated() -> Self {
        Self { gate: Some(Semaphore::new(0)), ..Self::default() }
    }

    async fn pass_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub fn with_cells(self, cells: impl IntoIterator<Item = Cell>) -> Self {
        {
            let mut map = self.cells.lock().unwrap();
            for c in cells {
                map.insert(c.coord(), c);
            }
        }
        self
    }

    pub fn with_heat(self, values: Vec<HeatValue>) -> Self {
        *self.heat.lock().unwrap() = values;
        self
    }

    pub fn fail_chunk(&self, chunk: FetchChunk, failing: bool) {
        let mut set = self.failing_chunks.lock().unwrap();
        if failing {
            set.insert(chunk);
        } else {
            set.remove(&chunk);
        }
    }

    pub fn cell_call_count(&self) -> usize {
        self.cell_calls.lock().unwrap().len()
    }

    pub fn cell_call_chunks(&self) -> Vec<FetchChunk> {
        self.cell_calls
            .lock()
            .unwrap()
            .iter()
            .map(|r| FetchChunk::containing(CellCoord::new(r.start_row, r.start_col)))
            .collect()
    }

    pub fn cell_call_ranges(&self) -> Vec<CellRange> {
        self.cell_calls.lock().unwrap().clone()
    }

    pub fn viewport_call_count(&self) -> usize {
        self.viewport_calls.load(Ordering::SeqCst)
    }

    pub fn heatmap_call_count(&self) -> usize {
        self.heatmap_calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn cells_in_range(&self, range: CellRange) -> Result<Vec<Cell>, ApiError> {
        self.cell_calls.lock().unwrap().push(range);
        self.pass_gate().await;
        let failing = self.failing_chunks.lock().unwrap().iter().any(|chunk| {
            let cells = chunk.cell_range();
            range.contains(CellCoord::new(cells.start_row, cells.start_col))
        });
        if failing {
            return Err(ApiError::Rejected("Failed to fetch messages".into()));
        }
        Ok(self.cells.lock().unwrap().values().filter(|c| range.contains(c.coord())).cloned().collect())
    }

    async fn heatmap_chunks(&self, chunks: &[HeatmapChunk]) -> Result<HeatmapResponse, ApiError> {
        self.heatmap_calls.lock().unwrap().push(chunks.to_vec());
        self.pass_gate().await;
        if self.fail_heatmap.load(Ordering::SeqCst) {
            return Err(ApiError::Rejected("Failed to load heatmap data".into()));
        }
        let data = self.heat.lock().unwrap().iter().filter(|v| chunks.contains(&v.chunk())).copied().collect();
        Ok(HeatmapResponse { chunk_size: 9, data })
    }

    async fn message_detail(&self, id: i64) -> Result<MessageDetail, ApiError> {
        self.cells
            .lock()
            .unwrap()
            .values()
            .find(|c| c.id == id)
            .map(|c| MessageDetail {
                content: c.content.clone().unwrap_or_default(),
                created_at: "2024-01-01T00:00:00Z".into(),
            })
            .ok_or_else(|| ApiError::Rejected("Message not found".into()))
    }

    async fn create_message(&self, message: &CreateMessage) -> Result<Cell, ApiError> {
        let id = i64::try_from(self.next_id.fetch_add(1, Ordering::SeqCst)).unwrap() + 1;
        let created = Cell {
            id,
            row_index: message.row_index,
            col_index: message.col_index,
            content: message.content.clone(),
            bg_color: message.bg_color.clone(),
        };
        self.cells.lock().unwrap().insert(created.coord(), created.clone());
        Ok(created)
    }

    async fn stats(&self) -> Result<StatsResponse, ApiError> {
        let total = self.cells.lock().unwrap().len() as u64;
        Ok(StatsResponse { total_messages: total, online_users: 1, visible_messages: total })
    }

    async fn viewport_message_count(&self, range: CellRange) -> Result<u64, ApiError> {
        self.viewport_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;
        if self.fail_viewport_count.load(Ordering::SeqCst) {
            return Err(ApiError::Rejected("Failed to fetch viewport stats".into()));
        }
        Ok(self.cells.lock().unwrap().values().filter(|c| range.contains(c.coord())).count() as u64)
    }

    async fn initial_position(&self) -> Result<InitialPosition, ApiError> {
        self.initial
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::Rejected("Failed to get initial position".into()))
    }
}
