//! Instrument Types
//!
//! Core row and quote types shared by the store, the feed and the view.
//! A row carries three independently owned field groups:
//!
//! - `static_fields`: loaded once from the bulk source
//! - `live_fields`: quote/volume attributes, replaced wholesale
//! - `derived_fields`: scores from the scoring service, replaced wholesale

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

// =============================================================================
// Types
// =============================================================================

/// A symbol string (stock ticker).
pub type Symbol = String;

/// Column name to value mapping for static and live fields.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Score name to value mapping for derived fields.
pub type DerivedFields = BTreeMap<String, f64>;

/// Columns that can be served from the live-quote cache.
pub const LIVE_QUOTE_COLUMNS: &[&str] = &["bid", "ask", "last", "price", "volume"];

/// Returns true if the column is backed by the live-quote cache.
#[must_use]
pub fn is_live_quote_column(column: &str) -> bool {
    LIVE_QUOTE_COLUMNS
        .iter()
        .any(|c| c.eq_ignore_ascii_case(column))
}

// =============================================================================
// Field Value
// =============================================================================

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric value.
    Number(f64),
    /// Free text value.
    Text(String),
}

impl FieldValue {
    /// Build a value from a raw cell, keeping numeric-looking cells numeric.
    #[must_use]
    pub fn from_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(trimmed.to_string()),
        }
    }

    /// Interpret the value as a finite number, parsing text if needed.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.is_finite().then_some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    /// Empty text counts as "no value".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Number(n) => n.is_nan(),
            Self::Text(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

// =============================================================================
// Instrument Row
// =============================================================================

/// One instrument in the working set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InstrumentRow {
    /// Primary key.
    pub symbol: Symbol,
    /// Attributes from the bulk source.
    #[serde(default)]
    pub static_fields: FieldMap,
    /// Quote attributes.
    #[serde(default)]
    pub live_fields: FieldMap,
    /// Computed scores.
    #[serde(default)]
    pub derived_fields: DerivedFields,
}

impl InstrumentRow {
    /// Create an empty row for a symbol.
    #[must_use]
    pub fn new(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Add a static field.
    #[must_use]
    pub fn with_static(mut self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.static_fields.insert(column.to_string(), value.into());
        self
    }

    /// Add a live field.
    #[must_use]
    pub fn with_live(mut self, column: &str, value: impl Into<FieldValue>) -> Self {
        self.live_fields.insert(column.to_string(), value.into());
        self
    }

    /// Add a derived score.
    #[must_use]
    pub fn with_derived(mut self, score: &str, value: f64) -> Self {
        self.derived_fields.insert(score.to_string(), value);
        self
    }
}

// =============================================================================
// Live Quote
// =============================================================================

/// Latest quote received from the push feed for a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveQuote {
    /// Quoted symbol.
    pub symbol: Symbol,
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
    /// Time the quote was received locally.
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl LiveQuote {
    /// Create an empty quote stamped now.
    #[must_use]
    pub fn new(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: symbol.into(),
            bid: None,
            ask: None,
            last: None,
            volume: None,
            received_at: Utc::now(),
        }
    }

    /// Value for a live-quote backed column, if present.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self, column: &str) -> Option<FieldValue> {
        let decimal = match column.to_ascii_lowercase().as_str() {
            "bid" => self.bid,
            "ask" => self.ask,
            "last" | "price" => self.last,
            "volume" => return self.volume.map(|v| FieldValue::Number(v as f64)),
            _ => None,
        };
        decimal
            .and_then(|d| d.to_f64())
            .map(FieldValue::Number)
    }
}

/// Scores for one symbol as returned by the scoring service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DerivedEntry {
    /// Scored symbol.
    pub symbol: Symbol,
    /// Complete derived field group for the symbol.
    pub scores: DerivedFields,
}

impl DerivedEntry {
    /// Create a new entry.
    #[must_use]
    pub fn new(symbol: impl Into<Symbol>, scores: DerivedFields) -> Self {
        Self {
            symbol: symbol.into(),
            scores,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    #[test]
    fn from_cell_detects_numbers() {
        assert_eq!(FieldValue::from_cell(" 10.5 "), FieldValue::Number(10.5));
        assert_eq!(FieldValue::from_cell("AAPL"), FieldValue::Text("AAPL".to_string()));
        assert_eq!(FieldValue::from_cell("inf"), FieldValue::Text("inf".to_string()));
    }

    #[test]
    fn as_number_parses_text() {
        assert_eq!(FieldValue::from("2").as_number(), Some(2.0));
        assert_eq!(FieldValue::from("n/a").as_number(), None);
        assert_eq!(FieldValue::Number(f64::NAN).as_number(), None);
    }

    #[test]
    fn empty_text_is_empty() {
        assert!(FieldValue::from("  ").is_empty());
        assert!(!FieldValue::from("x").is_empty());
        assert!(!FieldValue::Number(0.0).is_empty());
    }

    #[test]
    fn field_value_deserializes_untagged() {
        let values: Vec<FieldValue> = serde_json::from_str(r#"[1.5, "tech"]"#).unwrap();
        assert_eq!(values[0], FieldValue::Number(1.5));
        assert_eq!(values[1], FieldValue::Text("tech".to_string()));
    }

    #[test]
    fn quote_value_maps_columns() {
        let mut quote = LiveQuote::new("AAPL");
        quote.bid = Decimal::from_f64(150.25);
        quote.last = Decimal::from_f64(150.5);
        quote.volume = Some(1200);

        assert_eq!(quote.value("bid"), Some(FieldValue::Number(150.25)));
        assert_eq!(quote.value("price"), Some(FieldValue::Number(150.5)));
        assert_eq!(quote.value("LAST"), Some(FieldValue::Number(150.5)));
        assert_eq!(quote.value("volume"), Some(FieldValue::Number(1200.0)));
        assert_eq!(quote.value("ask"), None);
        assert_eq!(quote.value("sector"), None);
    }

    #[test]
    fn quote_accepts_price_alias() {
        let quote: LiveQuote =
            serde_json::from_str(r#"{"symbol":"MSFT","price":"401.10","volume":10}"#).unwrap();
        assert_eq!(quote.last, Decimal::from_str_exact("401.10").ok());
        assert_eq!(quote.volume, Some(10));
    }

    #[test]
    fn live_quote_columns() {
        assert!(is_live_quote_column("bid"));
        assert!(is_live_quote_column("Volume"));
        assert!(!is_live_quote_column("score"));
    }
}
