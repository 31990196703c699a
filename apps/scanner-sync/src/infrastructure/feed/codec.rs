//! Feed Codec
//!
//! JSON decoding of inbound frames and encoding of subscription requests.
//! Array frames are decoded element by element so one malformed element
//! only drops itself.

use chrono::Utc;

use super::messages::{Envelope, FeedMessage, KIND_QUOTE, QuotePayload, SubscribeRequest};
use crate::application::ports::{TradeEvent, TradeEventKind};
use crate::domain::instrument::{LiveQuote, Symbol};

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON encoding/decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Quote without a usable symbol.
    #[error("quote event without symbol")]
    MissingSymbol,

    /// Frame is neither an object nor an array.
    #[error("invalid message format: {0}")]
    InvalidFormat(String),
}

/// JSON codec for the push feed.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeedCodec;

impl FeedCodec {
    /// Create a new codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a text frame into one result per contained event.
    #[must_use]
    pub fn decode(&self, text: &str) -> Vec<Result<FeedMessage, CodecError>> {
        let value: serde_json::Value = match serde_json::from_str(text.trim()) {
            Ok(value) => value,
            Err(e) => return vec![Err(e.into())],
        };

        match value {
            serde_json::Value::Array(items) => {
                items.into_iter().map(|item| self.decode_value(item)).collect()
            }
            object @ serde_json::Value::Object(_) => vec![self.decode_value(object)],
            other => {
                let mut preview = other.to_string();
                preview.truncate(50);
                vec![Err(CodecError::InvalidFormat(format!(
                    "expected JSON array or object, got: {preview}"
                )))]
            }
        }
    }

    /// Decode a single envelope value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a valid envelope or a quote
    /// payload cannot be parsed.
    pub fn decode_value(&self, value: serde_json::Value) -> Result<FeedMessage, CodecError> {
        let envelope: Envelope = serde_json::from_value(value)?;

        let trade_kind = match envelope.kind.as_str() {
            KIND_QUOTE => return Self::decode_quote(envelope),
            "position_snapshot" => TradeEventKind::PositionSnapshot,
            "order_changed" => TradeEventKind::OrderChanged,
            "fill_occurred" => TradeEventKind::FillOccurred,
            _ => return Ok(FeedMessage::Unknown { kind: envelope.kind }),
        };

        Ok(FeedMessage::Trade(TradeEvent {
            kind: trade_kind,
            symbol: envelope.symbol,
            payload: envelope.payload,
            received_at: Utc::now(),
        }))
    }

    fn decode_quote(envelope: Envelope) -> Result<FeedMessage, CodecError> {
        let payload: QuotePayload = if envelope.payload.is_null() {
            QuotePayload::default()
        } else {
            serde_json::from_value(envelope.payload)?
        };

        let symbol = envelope
            .symbol
            .or(payload.symbol)
            .filter(|s| !s.trim().is_empty())
            .ok_or(CodecError::MissingSymbol)?;

        let mut quote = LiveQuote::new(symbol);
        quote.bid = payload.bid;
        quote.ask = payload.ask;
        quote.last = payload.last;
        quote.volume = payload.volume;
        Ok(FeedMessage::Quote(quote))
    }

    /// Encode a subscription request.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode_subscribe(&self, symbols: &[Symbol]) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&SubscribeRequest::new(symbols.to_vec()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn decode_one(text: &str) -> Result<FeedMessage, CodecError> {
        let mut results = FeedCodec::new().decode(text);
        assert_eq!(results.len(), 1);
        results.remove(0)
    }

    #[test]
    fn decode_quote_object() {
        let msg = decode_one(
            r#"{"kind":"quote","symbol":"AAPL","payload":{"bid":"150.10","ask":150.12,"price":150.11,"volume":1200}}"#,
        )
        .unwrap();

        let FeedMessage::Quote(quote) = msg else {
            panic!("expected quote");
        };
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.bid, Some(Decimal::new(15010, 2)));
        assert_eq!(quote.ask, Some(Decimal::new(15012, 2)));
        assert_eq!(quote.last, Some(Decimal::new(15011, 2)));
        assert_eq!(quote.volume, Some(1200));
    }

    #[test]
    fn decode_quote_symbol_from_payload() {
        let msg = decode_one(r#"{"kind":"quote","payload":{"symbol":"MSFT","last":"400"}}"#).unwrap();
        assert!(matches!(msg, FeedMessage::Quote(q) if q.symbol == "MSFT"));
    }

    #[test]
    fn quote_without_symbol_is_rejected() {
        let result = decode_one(r#"{"kind":"quote","payload":{"last":"400"}}"#);
        assert!(matches!(result, Err(CodecError::MissingSymbol)));
    }

    #[test]
    fn decode_trade_events() {
        let results = FeedCodec::new().decode(
            r#"[
                {"kind":"position_snapshot","payload":{"positions":[]}},
                {"kind":"order_changed","symbol":"AAPL","payload":{"status":"filled"}},
                {"kind":"fill_occurred","symbol":"AAPL","payload":{"qty":10}}
            ]"#,
        );

        let kinds: Vec<TradeEventKind> = results
            .into_iter()
            .map(|r| match r.unwrap() {
                FeedMessage::Trade(event) => event.kind,
                other => panic!("expected trade event, got {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                TradeEventKind::PositionSnapshot,
                TradeEventKind::OrderChanged,
                TradeEventKind::FillOccurred,
            ]
        );
    }

    #[test]
    fn unknown_kind_is_reported_not_failed() {
        let msg = decode_one(r#"{"kind":"heartbeat"}"#).unwrap();
        assert_eq!(msg, FeedMessage::Unknown { kind: "heartbeat".to_string() });
    }

    #[test]
    fn bad_element_only_drops_itself() {
        let results = FeedCodec::new().decode(
            r#"[
                {"kind":"quote","symbol":"AAPL","payload":{"last":"1.5"}},
                {"no_kind":true},
                {"kind":"quote","symbol":"MSFT","payload":{"volume":"lots"}},
                {"kind":"quote","symbol":"GOOG","payload":{"last":"2.5"}}
            ]"#,
        );

        assert_eq!(results.len(), 4);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_err());
        assert!(results[3].is_ok());
    }

    #[test]
    fn invalid_json_is_single_error() {
        let results = FeedCodec::new().decode("not json");
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(CodecError::Json(_))));
    }

    #[test]
    fn scalar_frame_is_invalid_format() {
        let results = FeedCodec::new().decode("42");
        assert!(matches!(results[0], Err(CodecError::InvalidFormat(_))));
    }

    #[test]
    fn encode_subscribe_request() {
        let json = FeedCodec::new()
            .encode_subscribe(&["AAPL".to_string(), "MSFT".to_string()])
            .unwrap();
        assert_eq!(json, r#"{"action":"subscribe","symbols":["AAPL","MSFT"]}"#);
    }
}
