//! Universe Source Port (Driven Port)
//!
//! Bulk source of instrument rows (file upload, fixture, ...).

use crate::domain::instrument::InstrumentRow;
use crate::error::ValidationError;

/// Port for reading the instrument universe.
pub trait UniverseSource: Send + Sync {
    /// Read every row from the source.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidSource` if the source cannot be read.
    fn load_rows(&self) -> Result<Vec<InstrumentRow>, ValidationError>;
}

/// In-memory universe, mostly for tests and fixtures.
#[derive(Debug, Clone, Default)]
pub struct StaticUniverse {
    rows: Vec<InstrumentRow>,
}

impl StaticUniverse {
    /// Wrap a fixed set of rows.
    #[must_use]
    pub const fn new(rows: Vec<InstrumentRow>) -> Self {
        Self { rows }
    }
}

impl UniverseSource for StaticUniverse {
    fn load_rows(&self) -> Result<Vec<InstrumentRow>, ValidationError> {
        Ok(self.rows.clone())
    }
}
