//! Feed Wire Messages
//!
//! Inbound frames carry one envelope or an array of envelopes:
//!
//! ```json
//! {"kind": "quote", "symbol": "AAPL", "payload": {"bid": "150.10", "ask": "150.12", "last": 150.11, "volume": 120000}}
//! ```
//!
//! Outbound subscription requests replace the whole interest set:
//!
//! ```json
//! {"action": "subscribe", "symbols": ["AAPL", "MSFT"]}
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ports::TradeEvent;
use crate::domain::instrument::{LiveQuote, Symbol};

/// Wire name of quote events.
pub const KIND_QUOTE: &str = "quote";

/// Raw inbound envelope before dispatch by kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    /// Event kind discriminator.
    pub kind: String,
    /// Symbol the event refers to.
    #[serde(default)]
    pub symbol: Option<Symbol>,
    /// Kind-specific body.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Body of a `quote` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct QuotePayload {
    /// Symbol, when not given on the envelope.
    #[serde(default)]
    pub symbol: Option<Symbol>,
    /// Best bid.
    #[serde(default)]
    pub bid: Option<Decimal>,
    /// Best ask.
    #[serde(default)]
    pub ask: Option<Decimal>,
    /// Last trade price.
    #[serde(default, alias = "price")]
    pub last: Option<Decimal>,
    /// Cumulative volume.
    #[serde(default)]
    pub volume: Option<u64>,
}

/// Decoded inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    /// Price tick for the quote cache.
    Quote(LiveQuote),
    /// Position, order or fill notification.
    Trade(TradeEvent),
    /// Well-formed envelope with a kind this client does not handle.
    Unknown {
        /// The unrecognized kind.
        kind: String,
    },
}

/// Outbound subscription request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscribeRequest {
    /// Always `"subscribe"`.
    pub action: &'static str,
    /// Complete interest set.
    pub symbols: Vec<Symbol>,
}

impl SubscribeRequest {
    /// Build a request for `symbols`.
    #[must_use]
    pub const fn new(symbols: Vec<Symbol>) -> Self {
        Self {
            action: "subscribe",
            symbols,
        }
    }
}
