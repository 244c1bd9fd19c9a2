//! WebSocket connection and command dispatcher.
//!
//! This module owns the persistent DevTools WebSocket, including command/
//! reply correlation by id and the per-command timeout.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that handles:
//!
//! - Incoming messages from the browser (replies, events)
//! - Outgoing commands from the Rust API
//! - Correlation-entry removal for timed-out commands
//!
//! Replies may arrive out of order relative to send order; matching is
//! strictly by id, never by position. Inbound messages that match no pending
//! command are event notifications or stale replies and are ignored.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{from_str, to_string, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{CommandId, CommandReply, CommandRequest};

// ============================================================================
// Constants
// ============================================================================

/// Fixed timeout for command execution (15s).
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(15);

/// Capability domains enabled right after the connection opens.
///
/// The browser silently no-ops commands belonging to a disabled domain, so
/// these must go out before any dependent command.
const ENABLE_METHODS: &[&str] = &["Page.enable", "Runtime.enable", "DOM.enable"];

// ============================================================================
// Types
// ============================================================================

/// Map of in-flight command ids to reply channels.
type CorrelationMap = FxHashMap<CommandId, oneshot::Sender<Result<CommandReply>>>;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of a connection.
///
/// Transitions are one-directional; `Closed` is terminal. A new
/// [`Connection`] must be created to reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection attempt made yet.
    #[default]
    Disconnected,
    /// WebSocket handshake in progress.
    Connecting,
    /// Connected; commands can be dispatched.
    Open,
    /// Closed by either side; dispatch fails with `NotConnected`.
    Closed,
}

// ============================================================================
// LoopCommand
// ============================================================================

/// Internal commands for the event loop.
enum LoopCommand {
    /// Send a command and correlate its reply.
    Dispatch {
        request: CommandRequest,
        reply_tx: oneshot::Sender<Result<CommandReply>>,
    },
    /// Send a command without registering a correlation entry.
    ///
    /// Its reply, if any, falls into the ignored-unmatched path.
    Fire { request: CommandRequest },
    /// Remove a timed-out correlation entry.
    RemoveCorrelation(CommandId),
    /// Shutdown the connection.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// A live DevTools Protocol connection.
///
/// Owned by the caller and passed explicitly to higher layers; nothing in
/// this crate holds a process-wide connection, so several sessions can
/// coexist, each with its own id counter and in-flight map.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync` and cheap to clone; clones share the same
/// underlying socket and state.
#[derive(Debug)]
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<LoopCommand>,
    /// Correlation map (shared with event loop).
    correlation: Arc<Mutex<CorrelationMap>>,
    /// Lifecycle state (shared with event loop).
    state: Arc<Mutex<ConnectionState>>,
    /// Monotonic command id counter; ids are never reused.
    next_id: Arc<AtomicU64>,
    /// Timeout applied to every dispatched command.
    command_timeout: Duration,
}

impl Clone for Connection {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            correlation: Arc::clone(&self.correlation),
            state: Arc::clone(&self.state),
            next_id: Arc::clone(&self.next_id),
            command_timeout: self.command_timeout,
        }
    }
}

impl Connection {
    /// Opens a connection to a DevTools WebSocket endpoint.
    ///
    /// On success the enable commands for the domains this client depends on
    /// have already been written to the wire (fire-and-forget; their replies
    /// are ignored).
    ///
    /// # Errors
    ///
    /// Returns [`Error::WebSocket`] if the WebSocket handshake fails.
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let state = Arc::new(Mutex::new(ConnectionState::Connecting));
        debug!(endpoint = %endpoint, "Opening DevTools WebSocket");

        let (ws_stream, _) = connect_async(endpoint).await?;

        let connection = Self::from_stream(ws_stream, state);

        for method in ENABLE_METHODS {
            connection.fire(method)?;
        }
        debug!("Connected, capability domains enabled");

        Ok(connection)
    }

    /// Creates a connection from an established WebSocket stream.
    ///
    /// Spawns the event loop task and marks the connection `Open`.
    pub(crate) fn from_stream<S>(
        ws_stream: WebSocketStream<S>,
        state: Arc<Mutex<ConnectionState>>,
    ) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));

        *state.lock() = ConnectionState::Open;

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&correlation),
            Arc::clone(&state),
        ));

        Self {
            command_tx,
            correlation,
            state,
            next_id: Arc::new(AtomicU64::new(1)),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Returns the number of in-flight commands.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.lock().len()
    }

    /// Dispatches a command and awaits its correlated reply.
    ///
    /// Uses the fixed command timeout (15s).
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the connection is not open
    /// - [`Error::Protocol`] if the reply carries an error field
    /// - [`Error::RequestTimeout`] if no reply arrives within the window
    pub async fn dispatch(&self, method: &str, params: Value) -> Result<Value> {
        self.dispatch_with_timeout(method, params, self.command_timeout)
            .await
    }

    /// Dispatches a command with an explicit timeout.
    ///
    /// Exactly one of reply-resolution and timeout-expiry wins: whichever
    /// fires first removes the in-flight entry, making the other a no-op.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::dispatch`].
    pub async fn dispatch_with_timeout(
        &self,
        method: &str,
        params: Value,
        command_timeout: Duration,
    ) -> Result<Value> {
        // Reject before touching the wire.
        if self.state() != ConnectionState::Open {
            return Err(Error::NotConnected);
        }

        let id = self.allocate_id();
        let request = CommandRequest::new(id, method, params);
        trace!(id = %id, method = %method, "Dispatching command");

        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(LoopCommand::Dispatch { request, reply_tx })
            .map_err(|_| Error::NotConnected)?;

        match timeout(command_timeout, reply_rx).await {
            Ok(Ok(reply)) => reply?.into_result(),
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                // Timeout - remove the in-flight entry so a late reply
                // becomes a no-op.
                let _ = self.command_tx.send(LoopCommand::RemoveCorrelation(id));

                warn!(id = %id, method = %method, "Command timed out");
                Err(Error::request_timeout(id, command_timeout.as_millis() as u64))
            }
        }
    }

    /// Sends a command without waiting for its reply.
    ///
    /// The id is still allocated from the monotonic counter; the reply is
    /// dropped by the unmatched-message path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if the connection is not open.
    pub fn fire(&self, method: &str) -> Result<()> {
        if self.state() != ConnectionState::Open {
            return Err(Error::NotConnected);
        }

        let request = CommandRequest::new(self.allocate_id(), method, Value::Null);
        self.command_tx
            .send(LoopCommand::Fire { request })
            .map_err(|_| Error::NotConnected)
    }

    /// Closes the connection.
    ///
    /// Terminal: all further dispatch attempts fail with `NotConnected`.
    pub fn close(&self) {
        *self.state.lock() = ConnectionState::Closed;
        let _ = self.command_tx.send(LoopCommand::Shutdown);
    }

    /// Allocates the next command id.
    fn allocate_id(&self) -> CommandId {
        CommandId::new(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Event loop that owns the WebSocket halves.
    async fn run_event_loop<S>(
        ws_stream: WebSocketStream<S>,
        mut command_rx: mpsc::UnboundedReceiver<LoopCommand>,
        correlation: Arc<Mutex<CorrelationMap>>,
        state: Arc<Mutex<ConnectionState>>,
    ) where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming messages from the browser
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming_message(&text, &correlation);
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from the Rust API
                command = command_rx.recv() => {
                    match command {
                        Some(LoopCommand::Dispatch { request, reply_tx }) => {
                            Self::handle_dispatch(
                                request,
                                reply_tx,
                                &mut ws_write,
                                &correlation,
                            ).await;
                        }

                        Some(LoopCommand::Fire { request }) => {
                            if let Ok(json) = to_string(&request) {
                                if let Err(e) = ws_write.send(Message::Text(json.into())).await {
                                    warn!(error = %e, method = %request.method, "Failed to fire command");
                                }
                            }
                        }

                        Some(LoopCommand::RemoveCorrelation(id)) => {
                            correlation.lock().remove(&id);
                            debug!(id = %id, "Removed timed-out correlation");
                        }

                        Some(LoopCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        // Terminal state; fail everything still in flight.
        *state.lock() = ConnectionState::Closed;
        Self::fail_pending_commands(&correlation);

        debug!("Event loop terminated");
    }

    /// Handles an incoming text message from the browser.
    fn handle_incoming_message(text: &str, correlation: &Arc<Mutex<CorrelationMap>>) {
        let reply: CommandReply = match from_str(text) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Failed to parse incoming message");
                return;
            }
        };

        let Some(id) = reply.id else {
            // Id-less messages are protocol event notifications, outside
            // this client's concern.
            trace!(method = ?reply.method, "Ignoring event notification");
            return;
        };

        let tx = correlation.lock().remove(&id);
        match tx {
            Some(tx) => {
                trace!(id = %id, "Reply matched pending command");
                let _ = tx.send(Ok(reply));
            }
            None => {
                trace!(id = %id, "Reply matched no pending command, ignoring");
            }
        }
    }

    /// Handles a dispatch command from the Rust API.
    async fn handle_dispatch<S>(
        request: CommandRequest,
        reply_tx: oneshot::Sender<Result<CommandReply>>,
        ws_write: &mut SplitSink<WebSocketStream<S>, Message>,
        correlation: &Arc<Mutex<CorrelationMap>>,
    ) where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let id = request.id;

        let json = match to_string(&request) {
            Ok(j) => j,
            Err(e) => {
                let _ = reply_tx.send(Err(Error::Json(e)));
                return;
            }
        };

        // Register correlation before sending so a fast reply can't race
        // past an unregistered id.
        correlation.lock().insert(id, reply_tx);

        if let Err(e) = ws_write.send(Message::Text(json.into())).await {
            if let Some(tx) = correlation.lock().remove(&id) {
                let _ = tx.send(Err(Error::connection(e.to_string())));
            }
            return;
        }

        trace!(id = %id, "Command sent");
    }

    /// Fails all in-flight commands with `ConnectionClosed`.
    fn fail_pending_commands(correlation: &Arc<Mutex<CorrelationMap>>) {
        let pending: Vec<_> = correlation.lock().drain().collect();
        let count = pending.len();

        for (_, tx) in pending {
            let _ = tx.send(Err(Error::ConnectionClosed));
        }

        if count > 0 {
            debug!(count, "Failed in-flight commands on shutdown");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use std::time::Instant;

    use crate::testkit::{respond_success, spawn_cdp_server};

    async fn connect_to(url: &str) -> Connection {
        Connection::connect(url).await.expect("connect")
    }

    /// Polls until the connection reaches `Closed` or the deadline passes.
    async fn wait_for_closed(connection: &Connection) {
        for _ in 0..100 {
            if connection.state() == ConnectionState::Closed {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("connection never reached Closed");
    }

    #[tokio::test]
    async fn test_dispatch_resolves_fast_reply() {
        let url = spawn_cdp_server(respond_success).await;
        let connection = connect_to(&url).await;

        let started = Instant::now();
        let payload = connection
            .dispatch("Page.navigate", json!({"url": "https://example.com"}))
            .await
            .expect("dispatch");

        assert_eq!(payload, json!({}));
        assert!(started.elapsed() < DEFAULT_COMMAND_TIMEOUT);
        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_command_ids_strictly_increase() {
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        let url = spawn_cdp_server(move |message: Value| {
            let id = message["id"].as_u64().expect("numeric id");
            seen_tx.send(id).expect("record id");
            respond_success(message)
        })
        .await;

        let connection = connect_to(&url).await;
        connection.dispatch("Page.navigate", json!({})).await.expect("first");
        connection.dispatch("Runtime.evaluate", json!({})).await.expect("second");

        let mut ids = Vec::new();
        while let Ok(id) = seen_rx.try_recv() {
            ids.push(id);
        }

        // Three enables plus two dispatches, all from one counter.
        assert_eq!(ids.len(), 5);
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids not increasing: {ids:?}");
    }

    #[tokio::test]
    async fn test_timeout_removes_in_flight_entry() {
        // Never reply to anything.
        let url = spawn_cdp_server(|_| Vec::new()).await;
        let connection = connect_to(&url).await;

        let err = connection
            .dispatch_with_timeout("Page.navigate", json!({}), Duration::from_millis(100))
            .await
            .expect_err("must time out");
        assert!(err.is_timeout());

        // Give the loop a beat to process the removal command.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_protocol_error_reply() {
        let url = spawn_cdp_server(|message: Value| {
            let id = message["id"].clone();
            vec![json!({"id": id, "error": {"code": -32000, "message": "Cannot navigate to invalid URL"}})
                .to_string()]
        })
        .await;

        let connection = connect_to(&url).await;
        let err = connection
            .dispatch("Page.navigate", json!({"url": "invalid-url"}))
            .await
            .expect_err("must fail");

        assert!(
            matches!(err, Error::Protocol { ref message } if message == "Cannot navigate to invalid URL")
        );
        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_unmatched_reply_and_event_are_ignored() {
        let url = spawn_cdp_server(|message: Value| {
            let id = message["id"].clone();
            vec![
                // Event notification, then a reply for an id never issued,
                // then the real reply.
                json!({"method": "Page.loadEventFired", "params": {"timestamp": 1.0}}).to_string(),
                json!({"id": 9999, "result": {"stale": true}}).to_string(),
                json!({"id": id, "result": {"ok": true}}).to_string(),
            ]
        })
        .await;

        let connection = connect_to(&url).await;
        let payload = connection.dispatch("Page.navigate", json!({})).await.expect("dispatch");

        assert_eq!(payload["ok"], true);
        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_after_close_fails_immediately() {
        let url = spawn_cdp_server(respond_success).await;
        let connection = connect_to(&url).await;

        connection.close();
        assert_eq!(connection.state(), ConnectionState::Closed);

        let started = Instant::now();
        let err = connection
            .dispatch("Page.navigate", json!({}))
            .await
            .expect_err("must fail");

        assert!(matches!(err, Error::NotConnected));
        // Immediate rejection, nothing sent on the wire.
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_remote_close_transitions_to_closed() {
        // Server that drops the socket after the enables arrive.
        let url = spawn_cdp_server({
            let mut seen = 0usize;
            move |_message: Value| {
                seen += 1;
                if seen >= 3 {
                    vec![crate::testkit::CLOSE_SENTINEL.to_string()]
                } else {
                    Vec::new()
                }
            }
        })
        .await;

        let connection = connect_to(&url).await;
        wait_for_closed(&connection).await;

        let err = connection
            .dispatch("Page.navigate", json!({}))
            .await
            .expect_err("must fail");
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn test_connect_failure_is_websocket_error() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let err = Connection::connect(&format!("ws://127.0.0.1:{port}"))
            .await
            .expect_err("must fail");

        assert!(matches!(err, Error::WebSocket(_)));
        assert!(err.is_connection_error());
    }

    #[tokio::test]
    async fn test_fire_does_not_register_correlation() {
        let url = spawn_cdp_server(respond_success).await;
        let connection = connect_to(&url).await;

        connection.fire("DOM.enable").expect("fire");
        assert_eq!(connection.pending_count(), 0);
    }
}
