//! CSV Universe Source
//!
//! Reads the instrument universe from a CSV file with a header row. The
//! `symbol` column (case-insensitive) is required; every other column
//! becomes a static field. Numeric-looking cells are stored as numbers and
//! empty cells are left out so the view can fall back to live quotes.

use std::io::Read;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;

use crate::application::ports::UniverseSource;
use crate::domain::instrument::{FieldValue, InstrumentRow};
use crate::error::ValidationError;

/// Universe backed by a CSV file.
#[derive(Debug, Clone)]
pub struct CsvUniverse {
    path: PathBuf,
}

impl CsvUniverse {
    /// Read from `path` on every load.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File this source reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UniverseSource for CsvUniverse {
    fn load_rows(&self) -> Result<Vec<InstrumentRow>, ValidationError> {
        let file = std::fs::File::open(&self.path).map_err(|e| {
            ValidationError::InvalidSource(format!("open {}: {e}", self.path.display()))
        })?;
        let rows = parse_csv(file)?;
        tracing::debug!(path = %self.path.display(), rows = rows.len(), "Read universe CSV");
        Ok(rows)
    }
}

/// Parse CSV text into rows.
///
/// Rows with an empty symbol are kept so that the store's load validation
/// rejects the whole file.
///
/// # Errors
///
/// Returns `ValidationError::InvalidSource` if the header has no `symbol`
/// column or a record cannot be read.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<InstrumentRow>, ValidationError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| ValidationError::InvalidSource(format!("read csv headers: {e}")))?
        .clone();

    let symbol_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("symbol"))
        .ok_or_else(|| ValidationError::InvalidSource("missing column symbol".to_string()))?;

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            ValidationError::InvalidSource(format!("read csv record {}: {e}", line + 1))
        })?;

        let mut row = InstrumentRow::new(record.get(symbol_idx).unwrap_or_default());
        for (idx, (column, cell)) in headers.iter().zip(record.iter()).enumerate() {
            if idx == symbol_idx || column.is_empty() || cell.is_empty() {
                continue;
            }
            row.static_fields
                .insert(column.to_string(), FieldValue::from_cell(cell));
        }
        rows.push(row);
    }

    Ok(rows)
}
