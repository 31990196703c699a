//! Scanner Core
//!
//! Explicitly constructed façade over the store, the selection and the view
//! state. The terminal drives everything through this object; there is no
//! process-wide domain state.
//!
//! # Reconciliation
//!
//! The selection is reconciled against the universe right after every
//! `load`, and again lazily on reads whenever the store's generation moved
//! (for loads that went straight to the store).

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::application::ports::{SubscriptionPort, UniverseSource};
use crate::domain::instrument::{InstrumentRow, Symbol};
use crate::domain::projection::{self, PageRequest, Projection, SortSpec, ViewState};
use crate::domain::selection::SelectionTracker;
use crate::domain::status::{ConnectionStatus, StatusBoard};
use crate::domain::store::{InstrumentStore, LoadSummary, StoreSnapshot};
use crate::error::ValidationError;
use crate::infrastructure::metrics;

#[derive(Debug, Default)]
struct SelectionState {
    tracker: SelectionTracker,
    generation: u64,
}

/// Façade over the synchronization core.
pub struct ScannerCore {
    store: Arc<InstrumentStore>,
    status: Arc<StatusBoard>,
    subscription: Arc<dyn SubscriptionPort>,
    selection: Mutex<SelectionState>,
    view: RwLock<ViewState>,
}

impl std::fmt::Debug for ScannerCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerCore")
            .field("store", &self.store)
            .field("status", &self.status)
            .field("view", &*self.view.read())
            .finish_non_exhaustive()
    }
}

impl ScannerCore {
    /// Build the façade around shared store and status board.
    #[must_use]
    pub fn new(
        store: Arc<InstrumentStore>,
        status: Arc<StatusBoard>,
        subscription: Arc<dyn SubscriptionPort>,
        page_size: usize,
    ) -> Self {
        let view = ViewState {
            page: PageRequest {
                page_size: page_size.max(1),
                ..PageRequest::default()
            },
            ..ViewState::default()
        };

        Self {
            store,
            status,
            subscription,
            selection: Mutex::new(SelectionState::default()),
            view: RwLock::new(view),
        }
    }

    // =========================================================================
    // Loading and subscription
    // =========================================================================

    /// Replace the universe, reconcile the selection and subscribe the feed
    /// to the new symbol set.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any row has an empty symbol; nothing
    /// changes in that case.
    pub fn load(&self, rows: Vec<InstrumentRow>) -> Result<LoadSummary, ValidationError> {
        let summary = self.store.load(rows).inspect_err(|e| {
            tracing::warn!(error = %e, "Universe load rejected, keeping previous rows");
        })?;
        metrics::set_instrument_rows(summary.loaded);

        let pruned = {
            let mut selection = self.selection.lock();
            let (universe, generation) = self.store.universe();
            selection.generation = generation;
            selection.tracker.reconcile(&universe)
        };

        tracing::info!(
            rows = summary.loaded,
            duplicates = summary.duplicates,
            generation = summary.generation,
            pruned_selection = pruned,
            "Universe loaded"
        );

        self.subscribe(self.store.symbols());
        Ok(summary)
    }

    /// Read rows from a source and load them.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the source cannot be read or a row is
    /// invalid.
    pub fn load_from(&self, source: &dyn UniverseSource) -> Result<LoadSummary, ValidationError> {
        let rows = source.load_rows()?;
        self.load(rows)
    }

    /// Declare interest in `symbols` on the push feed.
    pub fn subscribe(&self, symbols: Vec<Symbol>) {
        tracing::debug!(count = symbols.len(), "Updating feed subscription");
        self.subscription.subscribe(symbols);
    }

    // =========================================================================
    // Selection
    // =========================================================================

    fn reconciled(&self) -> MutexGuard<'_, SelectionState> {
        let mut selection = self.selection.lock();
        if selection.generation != self.store.generation() {
            let (universe, generation) = self.store.universe();
            let pruned = selection.tracker.reconcile(&universe);
            selection.generation = generation;
            if pruned > 0 {
                tracing::debug!(pruned, generation, "Selection reconciled");
            }
        }
        selection
    }

    /// Select a loaded symbol. Unknown symbols are ignored.
    pub fn select(&self, symbol: &str) -> bool {
        let mut selection = self.reconciled();
        self.store.contains(symbol) && selection.tracker.select(symbol)
    }

    /// Deselect a symbol.
    pub fn deselect(&self, symbol: &str) -> bool {
        self.reconciled().tracker.deselect(symbol)
    }

    /// Flip selection of a loaded symbol. Returns the new membership.
    pub fn toggle(&self, symbol: &str) -> bool {
        let mut selection = self.reconciled();
        if selection.tracker.contains(symbol) {
            selection.tracker.deselect(symbol);
            false
        } else {
            self.store.contains(symbol) && selection.tracker.select(symbol)
        }
    }

    /// Select every loaded symbol among `candidates`.
    pub fn select_all<I, S>(&self, candidates: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = self.reconciled();
        let known: Vec<S> = candidates
            .into_iter()
            .filter(|s| self.store.contains(s.as_ref()))
            .collect();
        selection.tracker.select_all(known)
    }

    /// Deselect every symbol among `candidates`.
    pub fn deselect_all<I, S>(&self, candidates: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.reconciled().tracker.deselect_all(candidates)
    }

    /// Drop the whole selection.
    pub fn clear_selection(&self) {
        self.selection.lock().tracker.clear();
    }

    /// Selected symbols in insertion order.
    #[must_use]
    pub fn selection(&self) -> Vec<Symbol> {
        self.reconciled().tracker.as_list()
    }

    /// Check whether a symbol is selected.
    #[must_use]
    pub fn is_selected(&self, symbol: &str) -> bool {
        self.reconciled().tracker.contains(symbol)
    }

    // =========================================================================
    // View state
    // =========================================================================

    /// Set the sort key and direction.
    pub fn set_sort(&self, sort: SortSpec) {
        self.view.write().sort = sort;
    }

    /// Request a 1-based page. Out-of-range pages clamp on projection.
    pub fn set_page(&self, page: usize) {
        self.view.write().page.page = page;
    }

    /// Change the page size (minimum 1) and return to the first page.
    pub fn set_page_size(&self, page_size: usize) {
        let mut view = self.view.write();
        view.page.page_size = page_size.max(1);
        view.page.page = 1;
    }

    /// Toggle "show all" mode.
    pub fn set_show_all(&self, show_all: bool) {
        let mut view = self.view.write();
        view.page.show_all = show_all;
        view.page.page = 1;
    }

    /// Set or clear the symbol filter and return to the first page.
    pub fn set_filter(&self, filter: Option<String>) {
        let mut view = self.view.write();
        view.filter = filter.filter(|f| !f.trim().is_empty());
        view.page.page = 1;
    }

    /// Set explicit visible columns, or `None` to derive them from the data.
    pub fn set_columns(&self, columns: Option<Vec<String>>) {
        self.view.write().columns = columns;
    }

    /// Current view state.
    #[must_use]
    pub fn view(&self) -> ViewState {
        self.view.read().clone()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Project the current state into rows to render.
    #[must_use]
    pub fn project(&self) -> Projection {
        self.project_snapshot(&self.store.snapshot())
    }

    /// Project against one snapshot. The selection is reconciled against
    /// that snapshot's universe, never against a later one.
    fn project_snapshot(&self, snapshot: &StoreSnapshot) -> Projection {
        let view = self.view.read().clone();
        let mut selection = self.selection.lock();
        if selection.generation == snapshot.generation {
            return projection::project(snapshot, &selection.tracker, &view);
        }

        let universe: HashSet<Symbol> = snapshot.symbols().into_iter().collect();
        if selection.generation < snapshot.generation {
            let pruned = selection.tracker.reconcile(&universe);
            selection.generation = snapshot.generation;
            if pruned > 0 {
                tracing::debug!(pruned, generation = snapshot.generation, "Selection reconciled");
            }
            projection::project(snapshot, &selection.tracker, &view)
        } else {
            // Selection already moved past this snapshot; prune a copy.
            let mut tracker = selection.tracker.clone();
            drop(selection);
            tracker.reconcile(&universe);
            projection::project(snapshot, &tracker, &view)
        }
    }

    /// Point-in-time copy of the store.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    /// Current connection flags.
    #[must_use]
    pub fn connection_status(&self) -> ConnectionStatus {
        self.status.get()
    }

    /// Shared store handle.
    #[must_use]
    pub const fn store(&self) -> &Arc<InstrumentStore> {
        &self.store
    }

    /// Number of selected symbols.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.reconciled().tracker.len()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{NoOpSubscription, StaticUniverse};
    use crate::domain::projection::SortDirection;

    #[derive(Debug, Default)]
    struct RecordingSubscription {
        calls: Mutex<Vec<Vec<Symbol>>>,
    }

    impl SubscriptionPort for RecordingSubscription {
        fn subscribe(&self, symbols: Vec<Symbol>) {
            self.calls.lock().push(symbols);
        }
    }

    fn core() -> ScannerCore {
        ScannerCore::new(
            Arc::new(InstrumentStore::new()),
            Arc::new(StatusBoard::new()),
            Arc::new(NoOpSubscription),
            2,
        )
    }

    fn rows(symbols: &[&str]) -> Vec<InstrumentRow> {
        symbols.iter().map(|s| InstrumentRow::new(*s)).collect()
    }

    #[test]
    fn reconciliation_after_load() {
        let core = core();
        core.load(rows(&["A", "B", "C"])).unwrap();
        core.select_all(["A", "B", "C"]);

        core.load(rows(&["B", "C"])).unwrap();

        assert_eq!(core.selection(), vec!["B", "C"]);
    }

    #[test]
    fn lazy_reconciliation_when_store_loaded_directly() {
        let core = core();
        core.load(rows(&["A", "B"])).unwrap();
        core.select("A");
        core.select("B");

        core.store().load(rows(&["B"])).unwrap();

        assert!(!core.is_selected("A"));
        assert_eq!(core.selected_count(), 1);
    }

    #[test]
    fn projection_counts_only_symbols_in_its_snapshot() {
        let core = core();
        core.load(rows(&["A", "B"])).unwrap();
        core.select_all(["A", "B"]);

        core.store().load(rows(&["B"])).unwrap();
        let projection = core.project();

        assert_eq!(projection.rows.len(), 1);
        assert_eq!(projection.selected_count, 1);
        assert_eq!(core.selection(), vec!["B"]);
    }

    #[test]
    fn projection_of_older_snapshot_ignores_newer_selection() {
        let core = core();
        core.load(rows(&["A"])).unwrap();
        let older = core.snapshot();

        core.load(rows(&["A", "B"])).unwrap();
        core.select("B");
        let projection = core.project_snapshot(&older);

        assert_eq!(projection.selected_count, 0);
        assert_eq!(core.selection(), vec!["B"]);
    }

    #[test]
    fn selection_survives_reload_for_kept_symbols() {
        let core = core();
        core.load(rows(&["A", "B"])).unwrap();
        core.select("B");

        core.load(rows(&["B", "A", "C"])).unwrap();

        assert_eq!(core.selection(), vec!["B"]);
    }

    #[test]
    fn unknown_symbols_cannot_be_selected() {
        let core = core();
        core.load(rows(&["A"])).unwrap();

        assert!(!core.select("ZZZ"));
        assert!(!core.toggle("ZZZ"));
        assert_eq!(core.select_all(["A", "ZZZ"]), 1);
        assert_eq!(core.selection(), vec!["A"]);
    }

    #[test]
    fn toggle_and_clear() {
        let core = core();
        core.load(rows(&["A", "B"])).unwrap();

        assert!(core.toggle("A"));
        assert!(!core.toggle("A"));
        core.select_all(["A", "B"]);
        core.clear_selection();

        assert!(core.selection().is_empty());
    }

    #[test]
    fn failed_load_keeps_rows_and_selection() {
        let core = core();
        core.load(rows(&["A", "B"])).unwrap();
        core.select("A");

        let result = core.load(vec![InstrumentRow::new("")]);

        assert!(result.is_err());
        assert_eq!(core.snapshot().symbols(), vec!["A", "B"]);
        assert_eq!(core.selection(), vec!["A"]);
    }

    #[test]
    fn load_subscribes_feed_to_universe() {
        let subscription = Arc::new(RecordingSubscription::default());
        let core = ScannerCore::new(
            Arc::new(InstrumentStore::new()),
            Arc::new(StatusBoard::new()),
            Arc::clone(&subscription) as Arc<dyn SubscriptionPort>,
            50,
        );

        core.load(rows(&["A", "B", "A"])).unwrap();

        assert_eq!(*subscription.calls.lock(), vec![vec!["B".to_string(), "A".to_string()]]);
    }

    #[test]
    fn load_from_source() {
        let core = core();
        let source = StaticUniverse::new(rows(&["X", "Y"]));

        let summary = core.load_from(&source).unwrap();

        assert_eq!(summary.loaded, 2);
    }

    #[test]
    fn project_uses_view_state() {
        let core = core();
        core.load(vec![
            InstrumentRow::new("A").with_static("price", 3.0),
            InstrumentRow::new("B").with_static("price", 1.0),
            InstrumentRow::new("C").with_static("price", 2.0),
        ])
        .unwrap();
        core.select("C");
        core.set_sort(SortSpec::by("price", SortDirection::Asc));
        core.set_page(99);

        let projection = core.project();

        assert_eq!(projection.page.page, 2);
        assert_eq!(projection.rows.len(), 1);
        assert_eq!(projection.rows[0].symbol, "A");
        assert_eq!(projection.selected_count, 1);

        core.set_page(1);
        let projection = core.project();
        let symbols: Vec<&str> = projection.rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["B", "C"]);
        assert!(projection.rows[1].selected);
    }

    #[test]
    fn view_setters_reset_page() {
        let core = core();
        core.set_page(3);
        core.set_filter(Some("aa".to_string()));
        assert_eq!(core.view().page.page, 1);

        core.set_page(3);
        core.set_page_size(0);
        let view = core.view();
        assert_eq!(view.page.page, 1);
        assert_eq!(view.page.page_size, 1);

        core.set_filter(Some("   ".to_string()));
        assert_eq!(core.view().filter, None);
    }

    #[test]
    fn connection_status_reads_board() {
        let status = Arc::new(StatusBoard::new());
        let core = ScannerCore::new(
            Arc::new(InstrumentStore::new()),
            Arc::clone(&status),
            Arc::new(NoOpSubscription),
            50,
        );

        status.set_feed_connected(true);

        assert!(core.connection_status().feed_connected);
    }
}
