//! Selection Tracker
//!
//! Owned set of selected symbols, independent of sort order and pagination.
//! Membership is exposed in insertion order so callers get a deterministic
//! list. The tracker knows nothing about the store; the owner calls
//! [`SelectionTracker::reconcile`] with the current universe after a load.

use std::collections::HashSet;

use crate::domain::instrument::Symbol;

/// Insertion-ordered set of selected symbols.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    order: Vec<Symbol>,
    members: HashSet<Symbol>,
}

impl SelectionTracker {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol. Returns `false` if it was already selected.
    pub fn select(&mut self, symbol: &str) -> bool {
        if self.members.contains(symbol) {
            return false;
        }
        self.members.insert(symbol.to_string());
        self.order.push(symbol.to_string());
        true
    }

    /// Remove a symbol. Returns `false` if it was not selected.
    pub fn deselect(&mut self, symbol: &str) -> bool {
        if !self.members.remove(symbol) {
            return false;
        }
        self.order.retain(|s| s != symbol);
        true
    }

    /// Flip membership of a symbol. Returns the new membership.
    pub fn toggle(&mut self, symbol: &str) -> bool {
        if self.deselect(symbol) {
            false
        } else {
            self.select(symbol)
        }
    }

    /// Select every candidate. Returns how many were newly added.
    pub fn select_all<I, S>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        candidates
            .into_iter()
            .filter(|s| self.select(s.as_ref()))
            .count()
    }

    /// Deselect every candidate. Returns how many were removed.
    pub fn deselect_all<I, S>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let targets: HashSet<String> = candidates
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .filter(|s| self.members.contains(s))
            .collect();
        if targets.is_empty() {
            return 0;
        }
        self.members.retain(|s| !targets.contains(s));
        self.order.retain(|s| !targets.contains(s));
        targets.len()
    }

    /// Drop every selection.
    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Check membership.
    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.members.contains(symbol)
    }

    /// True when every candidate is selected and there is at least one.
    #[must_use]
    pub fn all_selected<I, S>(&self, candidates: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut any = false;
        for candidate in candidates {
            if !self.members.contains(candidate.as_ref()) {
                return false;
            }
            any = true;
        }
        any
    }

    /// Selected symbols in insertion order.
    #[must_use]
    pub fn as_list(&self) -> Vec<Symbol> {
        self.order.clone()
    }

    /// Number of selected symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Remove every symbol absent from `universe`. Returns the pruned count.
    pub fn reconcile(&mut self, universe: &HashSet<Symbol>) -> usize {
        let before = self.order.len();
        self.order.retain(|s| universe.contains(s));
        self.members.retain(|s| universe.contains(s));
        before - self.order.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
