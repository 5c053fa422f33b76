//! Wire types shared by the REST transport and the realtime channel.
//!
//! Field names follow the server's camelCase JSON. Every REST response is
//! wrapped in [`ApiEnvelope`].

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

use crate::coords::{CellCoord, HeatmapChunk};
use crate::net::api::ApiError;

// =============================================================================
// ENVELOPE
// =============================================================================

/// `{success, message, data}` wrapper around every REST payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload, turning `success = false` into [`ApiError::Rejected`].
    ///
    /// The server message wins over `fallback` unless it is empty.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when the server reports failure and
    /// [`ApiError::MissingData`] when a successful envelope carries no data.
    pub fn into_result(self, fallback: &str) -> Result<T, ApiError> {
        if !self.success {
            let message = self
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_owned());
            return Err(ApiError::Rejected(message));
        }
        self.data.ok_or_else(|| ApiError::MissingData(fallback.to_owned()))
    }
}

// =============================================================================
// CELLS
// =============================================================================

/// One message cell as stored by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub id: i64,
    pub row_index: i64,
    pub col_index: i64,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub bg_color: Option<String>,
}

impl Cell {
    #[must_use]
    pub fn coord(&self) -> CellCoord {
        CellCoord::new(self.row_index, self.col_index)
    }
}

/// Body of `POST /api/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessage {
    pub row_index: i64,
    pub col_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    /// Version the edit is based on; `None` for a previously empty cell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_version_id: Option<i64>,
}

impl CreateMessage {
    #[must_use]
    pub fn text(cell: CellCoord, content: impl Into<String>) -> Self {
        Self {
            row_index: cell.row,
            col_index: cell.col,
            content: Some(content.into()),
            bg_color: None,
            base_version_id: None,
        }
    }

    #[must_use]
    pub fn coord(&self) -> CellCoord {
        CellCoord::new(self.row_index, self.col_index)
    }
}

/// Hover detail for a single message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDetail {
    pub content: String,
    pub created_at: String,
}

// =============================================================================
// HEATMAP
// =============================================================================

/// Response of `GET /api/heatmap/chunks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapResponse {
    pub chunk_size: i64,
    #[serde(default)]
    pub data: Vec<HeatValue>,
}

/// Heat value of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatValue {
    pub grid_x: i64,
    pub grid_y: i64,
    pub heat_value: u32,
}

impl HeatValue {
    #[must_use]
    pub fn chunk(&self) -> HeatmapChunk {
        HeatmapChunk::new(self.grid_x, self.grid_y)
    }
}

// =============================================================================
// STATS / POSITION
// =============================================================================

/// Response of `GET /api/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_messages: u64,
    pub online_users: u32,
    pub visible_messages: u64,
}

/// Payload of a `SYSTEM_STATS_UPDATED` push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    pub online_count: u32,
    pub total_messages: u64,
    #[serde(default)]
    pub visible_messages: Option<u64>,
}

/// Response of `GET /api/canvas/initial-position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialPosition {
    pub row_index: i64,
    pub col_index: i64,
    pub is_default: bool,
    #[serde(default)]
    pub message: Option<String>,
}
