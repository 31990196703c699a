//! Feed WebSocket Client
//!
//! Owns the single persistent connection to the push source.
//!
//! # State machine
//!
//! `Disconnected → Connecting → Connected → Disconnected` (on error, close
//! or explicit `disconnect`). The client never reconnects by itself; see
//! [`super::FeedSupervisor`] for the caller-level retry loop.
//!
//! # Tasks
//!
//! Each connection runs on its own tokio task that owns both halves of the
//! socket. `subscribe` and `disconnect` only hand requests to that task
//! through a channel and a cancellation token, so they never wait on I/O.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use super::codec::FeedCodec;
use super::messages::{FeedMessage, KIND_QUOTE};
use crate::application::ports::{SubscriptionPort, TradeEventSink};
use crate::domain::instrument::Symbol;
use crate::domain::status::StatusBoard;
use crate::domain::store::InstrumentStore;
use crate::error::ConnectionError;
use crate::infrastructure::metrics;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWrite = SplitSink<WsStream, Message>;
type WsRead = SplitStream<WsStream>;

const EVENT_CAPACITY: usize = 64;

// =============================================================================
// State and Events
// =============================================================================

/// Connection state of the feed client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// No connection.
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Connection established.
    Connected,
}

/// Connectivity changes published by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// A connection was established.
    Connected {
        /// Endpoint that was dialed.
        endpoint: String,
    },
    /// The connection ended.
    Disconnected {
        /// Why it ended.
        reason: String,
    },
}

struct Session {
    id: u64,
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

struct Inner {
    store: Arc<InstrumentStore>,
    sink: Arc<dyn TradeEventSink>,
    status: Arc<StatusBoard>,
    codec: FeedCodec,
    state: RwLock<FeedState>,
    interest: RwLock<Vec<Symbol>>,
    session: Mutex<Option<Session>>,
    next_session: AtomicU64,
    events: broadcast::Sender<ConnectivityEvent>,
}

// =============================================================================
// Feed Client
// =============================================================================

/// Push-feed subscriber. Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct FeedClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for FeedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedClient")
            .field("state", &self.state())
            .field("interest", &self.inner.interest.read().len())
            .finish_non_exhaustive()
    }
}

impl FeedClient {
    /// Create a disconnected client.
    #[must_use]
    pub fn new(
        store: Arc<InstrumentStore>,
        sink: Arc<dyn TradeEventSink>,
        status: Arc<StatusBoard>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                store,
                sink,
                status,
                codec: FeedCodec::new(),
                state: RwLock::new(FeedState::Disconnected),
                interest: RwLock::new(Vec::new()),
                session: Mutex::new(None),
                next_session: AtomicU64::new(1),
                events,
            }),
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> FeedState {
        *self.inner.state.read()
    }

    /// Receiver for connectivity events.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.inner.events.subscribe()
    }

    /// Symbols currently declared as interesting.
    #[must_use]
    pub fn interest(&self) -> Vec<Symbol> {
        self.inner.interest.read().clone()
    }

    /// Connect to `endpoint`, replacing any existing connection.
    ///
    /// On success the recorded interest is replayed to the server.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::AlreadyConnecting` if another attempt is in
    /// progress, or `ConnectionError::ConnectFailed` if the handshake fails
    /// (the client stays `Disconnected`).
    pub async fn connect(&self, endpoint: &str) -> Result<(), ConnectionError> {
        {
            let mut state = self.inner.state.write();
            if *state == FeedState::Connecting {
                return Err(ConnectionError::AlreadyConnecting);
            }
            if *state == FeedState::Connected {
                drop(state);
                self.disconnect();
                state = self.inner.state.write();
            }
            *state = FeedState::Connecting;
        }

        tracing::info!(endpoint, "Connecting to feed");

        let ws = match tokio_tungstenite::connect_async(endpoint).await {
            Ok((ws, _response)) => ws,
            Err(e) => {
                *self.inner.state.write() = FeedState::Disconnected;
                tracing::warn!(endpoint, error = %e, "Feed connection failed");
                return Err(ConnectionError::ConnectFailed {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let (write, read) = ws.split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let id = self.inner.next_session.fetch_add(1, Ordering::Relaxed);

        {
            let mut state = self.inner.state.write();
            if *state != FeedState::Connecting {
                return Err(ConnectionError::ConnectFailed {
                    endpoint: endpoint.to_string(),
                    reason: "disconnected during handshake".to_string(),
                });
            }
            *state = FeedState::Connected;

            // Interest is read and the session installed under one session
            // lock so a concurrent `subscribe` lands on one side or the other.
            let mut session = self.inner.session.lock();
            let interest = self.inner.interest.read().clone();
            if !interest.is_empty() {
                self.inner.queue_subscribe(&outbound, &interest);
            }
            *session = Some(Session {
                id,
                outbound,
                cancel: cancel.clone(),
            });
        }

        self.inner.status.set_feed_connected(true);
        metrics::set_feed_connected(true);
        let _ = self.inner.events.send(ConnectivityEvent::Connected {
            endpoint: endpoint.to_string(),
        });
        tracing::info!(endpoint, session = id, "Feed connected");

        tokio::spawn(run_session(
            Arc::clone(&self.inner),
            id,
            write,
            read,
            outbound_rx,
            cancel,
        ));

        Ok(())
    }

    /// Tear down the connection. Idempotent and safe from any state.
    pub fn disconnect(&self) {
        let session = self.inner.session.lock().take();
        let was = std::mem::replace(&mut *self.inner.state.write(), FeedState::Disconnected);

        if let Some(session) = session {
            session.cancel.cancel();
        }

        if was == FeedState::Connected {
            self.inner.mark_disconnected("client disconnect");
        }
    }

    /// Replace the interest set and send it when connected.
    pub fn subscribe(&self, symbols: Vec<Symbol>) {
        let session = self.inner.session.lock();
        *self.inner.interest.write() = symbols.clone();

        if let Some(session) = session.as_ref() {
            self.inner.queue_subscribe(&session.outbound, &symbols);
        }
    }

    /// Dispatch one inbound text frame.
    pub fn handle_text(&self, text: &str) {
        self.inner.dispatch(text);
    }
}

impl SubscriptionPort for FeedClient {
    fn subscribe(&self, symbols: Vec<Symbol>) {
        Self::subscribe(self, symbols);
    }
}

// =============================================================================
// Inbound Dispatch
// =============================================================================

impl Inner {
    fn queue_subscribe(&self, outbound: &mpsc::UnboundedSender<String>, symbols: &[Symbol]) {
        match self.codec.encode_subscribe(symbols) {
            Ok(json) => {
                tracing::debug!(count = symbols.len(), "Sending subscribe request");
                let _ = outbound.send(json);
            }
            Err(e) => tracing::error!(error = %e, "Failed to encode subscribe request"),
        }
    }

    fn dispatch(&self, text: &str) {
        for decoded in self.codec.decode(text) {
            match decoded {
                Ok(FeedMessage::Quote(quote)) => {
                    metrics::record_feed_message(KIND_QUOTE);
                    let symbol = quote.symbol.clone();
                    let applied = self.store.apply_live_quote(quote);
                    metrics::record_quote(applied);
                    if !applied {
                        tracing::trace!(symbol = %symbol, "Quote for unknown symbol dropped");
                    }
                }
                Ok(FeedMessage::Trade(event)) => {
                    metrics::record_feed_message(event.kind.as_str());
                    self.sink.publish(event);
                }
                Ok(FeedMessage::Unknown { kind }) => {
                    metrics::record_feed_message("unknown");
                    tracing::debug!(kind = %kind, "Ignoring unknown feed event kind");
                }
                Err(e) => {
                    metrics::record_parse_failure();
                    tracing::warn!(error = %e, "Dropping malformed feed message");
                }
            }
        }
    }

    fn mark_disconnected(&self, reason: &str) {
        self.status.set_feed_connected(false);
        metrics::set_feed_connected(false);
        let _ = self.events.send(ConnectivityEvent::Disconnected {
            reason: reason.to_string(),
        });
        tracing::info!(reason, "Feed disconnected");
    }

    /// Called by a session task when its connection ends on its own.
    fn on_session_closed(&self, id: u64, reason: &str) {
        {
            let mut session = self.session.lock();
            if session.as_ref().map(|s| s.id) != Some(id) {
                return;
            }
            *session = None;
        }
        *self.state.write() = FeedState::Disconnected;
        self.mark_disconnected(reason);
    }
}

// =============================================================================
// Session Task
// =============================================================================

async fn run_session(
    inner: Arc<Inner>,
    id: u64,
    mut write: WsWrite,
    mut read: WsRead,
    mut outbound: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) {
    let reason = loop {
        tokio::select! {
            () = cancel.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                break None;
            }
            frame = outbound.recv() => {
                let Some(text) = frame else { break None };
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    break Some(format!("send failed: {e}"));
                }
            }
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => inner.dispatch(&text),
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = write.send(Message::Pong(data)).await {
                            break Some(format!("pong failed: {e}"));
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        break Some("server closed connection".to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Some(e.to_string()),
                    None => break Some("stream ended".to_string()),
                }
            }
        }
    };

    if let Some(reason) = reason {
        inner.on_session_closed(id, &reason);
    }
    tracing::debug!(session = id, "Feed session task finished");
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{NoOpTradeEventSink, TradeEvent, TradeEventKind};
    use crate::domain::instrument::InstrumentRow;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<TradeEvent>>,
    }

    impl TradeEventSink for RecordingSink {
        fn publish(&self, event: TradeEvent) {
            self.events.lock().push(event);
        }
    }

    fn loaded_store() -> Arc<InstrumentStore> {
        let store = Arc::new(InstrumentStore::new());
        store.load(vec![InstrumentRow::new("AAPL")]).unwrap();
        store
    }

    #[test]
    fn new_client_is_disconnected() {
        let client = FeedClient::new(
            loaded_store(),
            Arc::new(NoOpTradeEventSink),
            Arc::new(StatusBoard::new()),
        );
        assert_eq!(client.state(), FeedState::Disconnected);
    }

    #[test]
    fn subscribe_while_disconnected_is_recorded() {
        let client = FeedClient::new(
            loaded_store(),
            Arc::new(NoOpTradeEventSink),
            Arc::new(StatusBoard::new()),
        );

        client.subscribe(vec!["AAPL".to_string()]);
        client.subscribe(vec!["MSFT".to_string()]);

        assert_eq!(client.interest(), vec!["MSFT"]);
    }

    #[test]
    fn disconnect_is_idempotent() {
        let status = Arc::new(StatusBoard::new());
        let client = FeedClient::new(loaded_store(), Arc::new(NoOpTradeEventSink), Arc::clone(&status));
        let mut events = client.events();

        client.disconnect();
        client.disconnect();

        assert_eq!(client.state(), FeedState::Disconnected);
        assert!(events.try_recv().is_err());
        assert!(!status.get().feed_connected);
    }

    #[test]
    fn dispatch_routes_by_kind() {
        let store = loaded_store();
        let sink = Arc::new(RecordingSink::default());
        let client = FeedClient::new(
            Arc::clone(&store),
            Arc::clone(&sink) as Arc<dyn TradeEventSink>,
            Arc::new(StatusBoard::new()),
        );

        client.handle_text(
            r#"[
                {"kind":"quote","symbol":"AAPL","payload":{"last":"150.5"}},
                {"kind":"quote","symbol":"TSLA","payload":{"last":"200"}},
                {"kind":"fill_occurred","symbol":"AAPL","payload":{"qty":5}},
                {"kind":"mystery"},
                {"broken":true}
            ]"#,
        );

        assert!(store.quote("AAPL").is_some());
        assert!(store.quote("TSLA").is_none());
        assert!(!store.contains("TSLA"));

        let events = sink.events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, TradeEventKind::FillOccurred);
    }

    #[tokio::test]
    async fn connect_failure_stays_disconnected() {
        let status = Arc::new(StatusBoard::new());
        let client = FeedClient::new(loaded_store(), Arc::new(NoOpTradeEventSink), Arc::clone(&status));

        let result = client.connect("ws://127.0.0.1:1/ws").await;

        assert!(matches!(result, Err(ConnectionError::ConnectFailed { .. })));
        assert_eq!(client.state(), FeedState::Disconnected);
        assert!(!status.get().feed_connected);
    }
}
