//! Scoring Port (Driven Port)
//!
//! Interface to the remote service that computes derived fields.

use async_trait::async_trait;

use crate::domain::instrument::{DerivedEntry, InstrumentRow};
use crate::error::TransientFetchError;

/// Port for recomputing derived fields of a snapshot.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScoringPort: Send + Sync {
    /// Score the given rows.
    ///
    /// The response may cover a subset of the rows; each entry carries the
    /// complete derived field group for its symbol.
    async fn score(&self, rows: Vec<InstrumentRow>) -> Result<Vec<DerivedEntry>, TransientFetchError>;
}
