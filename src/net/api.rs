//! REST transport for the Flux service.
//!
//! DESIGN
//! ======
//! [`Transport`] is the seam between the caching core and the network: the
//! loaders only ever talk to `Arc<dyn Transport>`, so tests swap in fakes and
//! the binary uses [`HttpTransport`].
//!
//! ERROR HANDLING
//! ==============
//! Every endpoint answers with a `{success, message, data}` envelope, also on
//! HTTP errors. The envelope message is preferred; when the body cannot be
//! read as an envelope the per-endpoint fallback string is used instead.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{ApiEnvelope, Cell, CreateMessage, HeatmapResponse, InitialPosition, MessageDetail, StatsResponse};
use crate::config::ClientConfig;
use crate::coords::{CellRange, HeatmapChunk, join_heatmap_keys};

// =============================================================================
// ERROR TYPE
// =============================================================================

/// Error returned by [`Transport`] calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
    /// The request could not be sent or the body could not be read.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success HTTP status and no readable envelope.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// The server answered with `success = false`.
    #[error("{0}")]
    Rejected(String),
    /// A successful envelope carried no `data`.
    #[error("missing response data: {0}")]
    MissingData(String),
    /// A successful response body was not valid JSON for the expected type.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

// =============================================================================
// TRANSPORT TRAIT
// =============================================================================

/// Request/response calls the caching core depends on.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// `GET /api/messages?startRow&endRow&startCol&endCol`.
    async fn cells_in_range(&self, range: CellRange) -> Result<Vec<Cell>, ApiError>;

    /// `GET /api/heatmap/chunks?chunks=x,y;x,y`.
    async fn heatmap_chunks(&self, chunks: &[HeatmapChunk]) -> Result<HeatmapResponse, ApiError>;

    /// `GET /api/messages/{id}`.
    async fn message_detail(&self, id: i64) -> Result<MessageDetail, ApiError>;

    /// `POST /api/messages`.
    async fn create_message(&self, message: &CreateMessage) -> Result<Cell, ApiError>;

    /// `GET /api/stats`.
    async fn stats(&self) -> Result<StatsResponse, ApiError>;

    /// `GET /api/stats/viewport?startRow&endRow&startCol&endCol`.
    async fn viewport_message_count(&self, range: CellRange) -> Result<u64, ApiError>;

    /// `GET /api/canvas/initial-position`.
    async fn initial_position(&self) -> Result<InitialPosition, ApiError>;
}

// =============================================================================
// HTTP TRANSPORT
// =============================================================================

/// [`Transport`] backed by `reqwest`.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    api_base: String,
}

impl HttpTransport {
    /// Build a transport using the timeouts and base URL from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, api_base: config.api_base() })
    }

    /// Build a transport against an explicit API base such as `http://host/api`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the HTTP client cannot be built.
    pub fn with_api_base(api_base: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, api_base: api_base.trim_end_matches('/').to_owned() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn get<T, Q>(&self, path: &str, query: &Q, fallback: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self.http.get(self.url(path)).query(query).send().await?;
        read_envelope(response, fallback).await
    }
}

async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response, fallback: &str) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.bytes().await?;
    match serde_json::from_slice::<ApiEnvelope<T>>(&body) {
        Ok(envelope) => envelope.into_result(fallback),
        Err(_) if !status.is_success() => Err(ApiError::Status {
            status: status.as_u16(),
            message: fallback.to_owned(),
        }),
        Err(e) => Err(ApiError::Decode(e)),
    }
}

const NO_QUERY: [(&str, &str); 0] = [];

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn cells_in_range(&self, range: CellRange) -> Result<Vec<Cell>, ApiError> {
        self.get("/messages", &range, "Failed to fetch messages").await
    }

    async fn heatmap_chunks(&self, chunks: &[HeatmapChunk]) -> Result<HeatmapResponse, ApiError> {
        let joined = join_heatmap_keys(chunks);
        self.get("/heatmap/chunks", &[("chunks", joined.as_str())], "Failed to load heatmap data")
            .await
    }

    async fn message_detail(&self, id: i64) -> Result<MessageDetail, ApiError> {
        let fallback = format!("Failed to fetch message detail for id {id}");
        self.get(&format!("/messages/{id}"), &NO_QUERY, &fallback).await
    }

    async fn create_message(&self, message: &CreateMessage) -> Result<Cell, ApiError> {
        let response = self.http.post(self.url("/messages")).json(message).send().await?;
        read_envelope(response, "Failed to create message").await
    }

    async fn stats(&self) -> Result<StatsResponse, ApiError> {
        self.get("/stats", &NO_QUERY, "Failed to fetch stats").await
    }

    async fn viewport_message_count(&self, range: CellRange) -> Result<u64, ApiError> {
        self.get("/stats/viewport", &range, "Failed to fetch viewport stats").await
    }

    async fn initial_position(&self) -> Result<InitialPosition, ApiError> {
        self.get("/canvas/initial-position", &NO_QUERY, "Failed to get initial position")
            .await
    }
}
