//! Trade Event Broadcast
//!
//! Default [`TradeEventSink`]: fans position, order and fill notifications
//! out on tokio broadcast channels, one per kind, so order and position
//! views can subscribe independently.

use tokio::sync::broadcast;

use crate::application::ports::{TradeEvent, TradeEventKind, TradeEventSink};

/// Channel capacities per event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeEventHubConfig {
    /// Capacity for position snapshots.
    pub positions_capacity: usize,
    /// Capacity for order changes.
    pub orders_capacity: usize,
    /// Capacity for fills.
    pub fills_capacity: usize,
}

impl Default for TradeEventHubConfig {
    fn default() -> Self {
        Self {
            positions_capacity: 256,
            orders_capacity: 1_000,
            fills_capacity: 1_000,
        }
    }
}

/// Central hub for trade event channels.
///
/// # Example
///
/// ```rust
/// use scanner_sync::infrastructure::broadcast::TradeEventHub;
///
/// let hub = TradeEventHub::with_defaults();
/// let mut fills = hub.fills_rx();
/// assert_eq!(hub.receiver_count(), 1);
/// # drop(fills.try_recv());
/// ```
#[derive(Debug)]
pub struct TradeEventHub {
    positions_tx: broadcast::Sender<TradeEvent>,
    orders_tx: broadcast::Sender<TradeEvent>,
    fills_tx: broadcast::Sender<TradeEvent>,
}

impl TradeEventHub {
    /// Create a hub with the given capacities.
    #[must_use]
    pub fn new(config: TradeEventHubConfig) -> Self {
        Self {
            positions_tx: broadcast::channel(config.positions_capacity).0,
            orders_tx: broadcast::channel(config.orders_capacity).0,
            fills_tx: broadcast::channel(config.fills_capacity).0,
        }
    }

    /// Create a hub with default capacities.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(TradeEventHubConfig::default())
    }

    const fn sender(&self, kind: TradeEventKind) -> &broadcast::Sender<TradeEvent> {
        match kind {
            TradeEventKind::PositionSnapshot => &self.positions_tx,
            TradeEventKind::OrderChanged => &self.orders_tx,
            TradeEventKind::FillOccurred => &self.fills_tx,
        }
    }

    /// Receiver for position snapshots.
    #[must_use]
    pub fn positions_rx(&self) -> broadcast::Receiver<TradeEvent> {
        self.positions_tx.subscribe()
    }

    /// Receiver for order changes.
    #[must_use]
    pub fn orders_rx(&self) -> broadcast::Receiver<TradeEvent> {
        self.orders_tx.subscribe()
    }

    /// Receiver for fills.
    #[must_use]
    pub fn fills_rx(&self) -> broadcast::Receiver<TradeEvent> {
        self.fills_tx.subscribe()
    }

    /// Total active receivers across all channels.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.positions_tx.receiver_count()
            + self.orders_tx.receiver_count()
            + self.fills_tx.receiver_count()
    }
}

impl Default for TradeEventHub {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TradeEventSink for TradeEventHub {
    fn publish(&self, event: TradeEvent) {
        let kind = event.kind;
        if self.sender(kind).send(event).is_err() {
            tracing::trace!(kind = kind.as_str(), "No receivers for trade event");
        }
    }
}
