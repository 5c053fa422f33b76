//! Realtime update channel over a single WebSocket.
//!
//! DESIGN
//! ======
//! `RealtimeChannel` is an explicitly constructed service, cloned into every
//! consumer that needs it. One background task owns the socket and walks
//! `Disconnected → Connecting → Open → Disconnected`, then loops. Inbound
//! frames are JSON `{type, payload}` envelopes applied straight to the
//! [`FluxStore`]. There is no backlog replay on reconnect; missed state is
//! caught up by the next viewport fetch.
//!
//! ERROR HANDLING
//! ==============
//! Nothing here is fatal. A malformed frame is logged and skipped without
//! closing the socket. A dropped stream, a transport error or a failed
//! connect attempt schedules one reconnect after the fixed delay, forever.
//! Only a Close frame from the server or [`RealtimeChannel::shutdown`] ends
//! the loop. Outbound sends while not open are logged and dropped.

#[cfg(test)]
#[path = "realtime_test.rs"]
mod realtime_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

use super::types::{Cell, SystemStats};
use crate::coords::CellCoord;
use crate::state::FluxStore;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket transport failed: {0}")]
    Transport(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("invalid realtime message: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown realtime message type: {0}")]
    UnknownType(String),
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Server → client push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    CellUpdated(Cell),
    CellDeleted(CellCoord),
    UserIsEditing(CellCoord),
    UserStoppedEditing(CellCoord),
    OnlineCountUpdated(u32),
    SystemStatsUpdated(SystemStats),
}

/// Client → server presence notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outbound {
    UserIsEditing(CellCoord),
    UserStoppedEditing(CellCoord),
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

/// Parse one text frame.
///
/// # Errors
///
/// Returns [`RealtimeError::Parse`] for malformed JSON or a payload of the
/// wrong shape, and [`RealtimeError::UnknownType`] for an unrecognised `type`.
pub fn parse_inbound(text: &str) -> Result<Inbound, RealtimeError> {
    let RawEnvelope { kind, payload } = serde_json::from_str(text)?;
    let message = match kind.as_str() {
        "CELL_UPDATED" => Inbound::CellUpdated(serde_json::from_value(payload)?),
        "CELL_DELETED" => Inbound::CellDeleted(serde_json::from_value(payload)?),
        "USER_IS_EDITING" => Inbound::UserIsEditing(serde_json::from_value(payload)?),
        "USER_STOPPED_EDITING" => Inbound::UserStoppedEditing(serde_json::from_value(payload)?),
        "ONLINE_COUNT_UPDATED" => Inbound::OnlineCountUpdated(serde_json::from_value(payload)?),
        "SYSTEM_STATS_UPDATED" => Inbound::SystemStatsUpdated(serde_json::from_value(payload)?),
        _ => return Err(RealtimeError::UnknownType(kind)),
    };
    Ok(message)
}

/// Apply a push to the caches.
pub fn apply_inbound(store: &FluxStore, message: Inbound) {
    match message {
        Inbound::CellUpdated(cell) => {
            store.upsert_cell(cell);
        }
        Inbound::CellDeleted(coord) => {
            store.remove_cell(coord);
        }
        Inbound::UserIsEditing(coord) => {
            store.lock_cell(coord);
        }
        Inbound::UserStoppedEditing(coord) => {
            store.unlock_cell(coord);
        }
        Inbound::OnlineCountUpdated(count) => store.set_online_users(count),
        Inbound::SystemStatsUpdated(stats) => store.apply_system_stats(stats),
    }
}

// =============================================================================
// CHANNEL
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Default)]
struct Session {
    /// Sender into the current socket; `Some` only while open.
    outbound: Option<mpsc::UnboundedSender<String>>,
    task: Option<JoinHandle<()>>,
}

struct ChannelInner {
    url: String,
    reconnect_delay: Duration,
    store: FluxStore,
    state: watch::Sender<ConnectionState>,
    session: Mutex<Session>,
}

/// Handle to the shared realtime connection.
#[derive(Clone)]
pub struct RealtimeChannel {
    inner: Arc<ChannelInner>,
}

impl RealtimeChannel {
    #[must_use]
    pub fn new(url: impl Into<String>, reconnect_delay: Duration, store: FluxStore) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(ChannelInner {
                url: url.into(),
                reconnect_delay,
                store,
                state,
                session: Mutex::new(Session::default()),
            }),
        }
    }

    /// Start the connection task. No-op while a session or a pending
    /// reconnect is alive. Must be called from within a tokio runtime.
    pub fn connect(&self) {
        let mut session = self.inner.session();
        if session.task.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }
        let inner = Arc::clone(&self.inner);
        session.task = Some(tokio::spawn(run(inner)));
    }

    /// Stop the connection and any pending reconnect.
    pub fn shutdown(&self) {
        let mut session = self.inner.session();
        session.outbound = None;
        if let Some(task) = session.task.take() {
            task.abort();
        }
        drop(session);
        self.inner.set_state(ConnectionState::Disconnected);
    }

    /// Send a presence notification. Returns `false` when dropped because
    /// the socket is not open.
    pub fn send(&self, message: &Outbound) -> bool {
        let Some(outbound) = self.inner.session().outbound.clone() else {
            error!(?message, "realtime: cannot send, socket is not connected");
            return false;
        };
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "realtime: failed to encode outbound message");
                return false;
            }
        };
        if outbound.send(text).is_err() {
            error!(?message, "realtime: cannot send, socket is closing");
            return false;
        }
        true
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.url
    }
}

impl ChannelInner {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    fn handle_text(&self, text: &str) {
        match parse_inbound(text) {
            Ok(message) => apply_inbound(&self.store, message),
            Err(RealtimeError::UnknownType(kind)) => {
                warn!(%kind, "realtime: unknown message type");
            }
            Err(e) => error!(error = %e, "realtime: failed to parse message"),
        }
    }

    /// Pump one open socket. Returns `true` on a clean close.
    async fn pump(&self, socket: Socket) -> bool {
        let (mut sink, mut source) = socket.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        self.session().outbound = Some(tx);
        self.set_state(ConnectionState::Open);

        loop {
            tokio::select! {
                Some(text) = rx.recv() => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        warn!(error = %RealtimeError::Transport(Box::new(e)), "realtime: send failed");
                        return false;
                    }
                }
                frame = source.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.handle_text(text.as_str()),
                    Some(Ok(Message::Close(close))) => {
                        debug!(?close, "realtime: close frame received");
                        return true;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %RealtimeError::Transport(Box::new(e)), "realtime: socket error");
                        return false;
                    }
                    None => return false,
                },
            }
        }
    }
}

async fn run(inner: Arc<ChannelInner>) {
    loop {
        inner.set_state(ConnectionState::Connecting);
        let clean = match connect_async(inner.url.as_str()).await {
            Ok((socket, _)) => {
                info!(url = %inner.url, "realtime: connected");
                inner.pump(socket).await
            }
            Err(e) => {
                warn!(url = %inner.url, error = %RealtimeError::Connect(Box::new(e)), "realtime: connect failed");
                false
            }
        };
        inner.session().outbound = None;
        inner.set_state(ConnectionState::Disconnected);

        if clean {
            info!("realtime: connection closed cleanly");
            return;
        }
        warn!(
            delay_ms = u64::try_from(inner.reconnect_delay.as_millis()).unwrap_or(u64::MAX),
            "realtime: connection lost, reconnecting"
        );
        tokio::time::sleep(inner.reconnect_delay).await;
    }
}
