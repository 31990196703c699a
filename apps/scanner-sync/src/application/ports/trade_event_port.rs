//! Trade Event Port (Driven Port)
//!
//! Position, order and fill notifications arrive on the push feed but are
//! not part of the instrument table. They are handed to a sink owned by
//! whoever renders order and position views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::instrument::Symbol;

/// Kind of trade notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeEventKind {
    /// Full position snapshot.
    PositionSnapshot,
    /// Order status changed.
    OrderChanged,
    /// An order was (partially) filled.
    FillOccurred,
}

impl TradeEventKind {
    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PositionSnapshot => "position_snapshot",
            Self::OrderChanged => "order_changed",
            Self::FillOccurred => "fill_occurred",
        }
    }
}

/// A trade notification with its opaque payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    /// Notification kind.
    pub kind: TradeEventKind,
    /// Symbol the event refers to, when present.
    pub symbol: Option<Symbol>,
    /// Raw payload as received.
    pub payload: serde_json::Value,
    /// Local receive time.
    pub received_at: DateTime<Utc>,
}

/// Port for forwarding trade notifications.
pub trait TradeEventSink: Send + Sync {
    /// Forward one event. Must not block.
    fn publish(&self, event: TradeEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTradeEventSink;

impl TradeEventSink for NoOpTradeEventSink {
    fn publish(&self, _event: TradeEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_wire_names_match_serde() {
        for kind in [
            TradeEventKind::PositionSnapshot,
            TradeEventKind::OrderChanged,
            TradeEventKind::FillOccurred,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
