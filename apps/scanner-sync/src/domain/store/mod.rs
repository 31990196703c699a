//! Instrument Store
//!
//! Authoritative collection of instrument rows plus the companion live-quote
//! cache. All state sits behind a single lock so every operation is atomic
//! with respect to the others: a `load` in progress is never partially
//! visible to a concurrent `snapshot`, and a derived batch is applied whole.
//!
//! # Mutations
//!
//! - `load`: replaces the row set wholesale
//! - `apply_live_quote`: upserts into the quote cache for known symbols
//! - `apply_derived_batch`: replaces derived fields on known rows

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use crate::domain::instrument::{DerivedEntry, InstrumentRow, LiveQuote, Symbol};
use crate::error::ValidationError;

// =============================================================================
// Results
// =============================================================================

/// Outcome of a successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    /// Unique rows now in the store.
    pub loaded: usize,
    /// Input rows superseded by a later row with the same symbol.
    pub duplicates: usize,
    /// Universe generation after the load.
    pub generation: u64,
}

/// Outcome of a derived batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    /// Entries applied to a known row.
    pub applied: usize,
    /// Entries dropped because the symbol is not loaded.
    pub dropped: usize,
}

/// Immutable point-in-time copy of the store.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    /// Rows in load order.
    pub rows: Vec<InstrumentRow>,
    /// Live-quote cache keyed by symbol.
    pub quotes: HashMap<Symbol, LiveQuote>,
    /// Universe generation the snapshot was taken at.
    pub generation: u64,
}

impl StoreSnapshot {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no rows are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Symbols in load order.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        self.rows.iter().map(|r| r.symbol.clone()).collect()
    }
}

// =============================================================================
// Store
// =============================================================================

#[derive(Debug, Default)]
struct StoreState {
    rows: HashMap<Symbol, InstrumentRow>,
    order: Vec<Symbol>,
    quotes: HashMap<Symbol, LiveQuote>,
    generation: u64,
}

/// Thread-safe instrument store.
///
/// # Example
///
/// ```rust
/// use scanner_sync::domain::instrument::InstrumentRow;
/// use scanner_sync::domain::store::InstrumentStore;
///
/// let store = InstrumentStore::new();
/// store
///     .load(vec![InstrumentRow::new("AAPL"), InstrumentRow::new("MSFT")])
///     .unwrap();
///
/// assert!(store.contains("AAPL"));
/// assert_eq!(store.snapshot().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct InstrumentStore {
    state: RwLock<StoreState>,
}

impl InstrumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole row collection.
    ///
    /// Duplicate symbols resolve to the last occurrence, which also decides
    /// the row's position in load order. Quote cache entries for symbols
    /// that left the universe are dropped.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptySymbol` if any row has an empty symbol.
    /// The store is left untouched in that case.
    pub fn load(&self, rows: Vec<InstrumentRow>) -> Result<LoadSummary, ValidationError> {
        if let Some(index) = rows.iter().position(|r| r.symbol.trim().is_empty()) {
            return Err(ValidationError::EmptySymbol { index });
        }

        let total = rows.len();
        let last_index: HashMap<Symbol, usize> = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (r.symbol.clone(), i))
            .collect();

        let mut order = Vec::with_capacity(last_index.len());
        let mut by_symbol = HashMap::with_capacity(last_index.len());
        for (i, row) in rows.into_iter().enumerate() {
            if last_index.get(&row.symbol) == Some(&i) {
                order.push(row.symbol.clone());
                by_symbol.insert(row.symbol.clone(), row);
            }
        }

        let mut state = self.state.write();
        state.quotes.retain(|symbol, _| by_symbol.contains_key(symbol));
        state.rows = by_symbol;
        state.order = order;
        state.generation += 1;

        Ok(LoadSummary {
            loaded: state.order.len(),
            duplicates: total - state.order.len(),
            generation: state.generation,
        })
    }

    /// Upsert a quote into the live-quote cache.
    ///
    /// Returns `false` without touching anything if the symbol is not loaded.
    pub fn apply_live_quote(&self, quote: LiveQuote) -> bool {
        let mut state = self.state.write();
        if !state.rows.contains_key(&quote.symbol) {
            return false;
        }
        state.quotes.insert(quote.symbol.clone(), quote);
        true
    }

    /// Replace derived fields for every known symbol in the batch.
    pub fn apply_derived_batch(&self, entries: Vec<DerivedEntry>) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let mut state = self.state.write();

        for entry in entries {
            match state.rows.get_mut(&entry.symbol) {
                Some(row) => {
                    row.derived_fields = entry.scores;
                    summary.applied += 1;
                }
                None => summary.dropped += 1,
            }
        }

        summary
    }

    /// Copy of all rows in load order together with the quote cache.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read();
        StoreSnapshot {
            rows: state
                .order
                .iter()
                .filter_map(|s| state.rows.get(s))
                .cloned()
                .collect(),
            quotes: state.quotes.clone(),
            generation: state.generation,
        }
    }

    /// Check whether a symbol is loaded.
    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.state.read().rows.contains_key(symbol)
    }

    /// Number of loaded rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().order.len()
    }

    /// True when nothing is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().order.is_empty()
    }

    /// Loaded symbols in load order.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        self.state.read().order.clone()
    }

    /// Loaded symbols as a set, with the generation they belong to.
    #[must_use]
    pub fn universe(&self) -> (HashSet<Symbol>, u64) {
        let state = self.state.read();
        (state.rows.keys().cloned().collect(), state.generation)
    }

    /// Current universe generation (incremented on every load).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Cached quote for a symbol.
    #[must_use]
    pub fn quote(&self, symbol: &str) -> Option<LiveQuote> {
        self.state.read().quotes.get(symbol).cloned()
    }
}

// =============================================================================
// Tests
// =============================================================================
