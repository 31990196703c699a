//! View Projection
//!
//! Pure transformation of materialized state into rows to render:
//!
//! 1. Filter rows by symbol substring (optional)
//! 2. Sort by the configured key, numeric when both operands parse
//! 3. Paginate (1-based pages, clamped, or "show all")
//! 4. Resolve and format every requested column, annotate selection
//!
//! Column resolution order is derived, then live, then static fields. Live
//! quote backed columns fall back to the quote cache when the row itself
//! has no value. Anything still missing renders as [`NO_VALUE`].

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::domain::instrument::{
    FieldValue, InstrumentRow, LIVE_QUOTE_COLUMNS, LiveQuote, Symbol, is_live_quote_column,
};
use crate::domain::selection::SelectionTracker;
use crate::domain::store::StoreSnapshot;

/// Rendered placeholder for a missing value.
pub const NO_VALUE: &str = "-";

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Decimal places for score columns.
pub const SCORE_PRECISION: usize = 4;

/// Decimal places for every other numeric column.
pub const DEFAULT_PRECISION: usize = 2;

// =============================================================================
// View State
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Sort key and direction. No key keeps load order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Column to sort by.
    pub key: Option<String>,
    /// Direction.
    pub direction: SortDirection,
}

impl SortSpec {
    /// Sort by a column.
    #[must_use]
    pub fn by(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: Some(key.into()),
            direction,
        }
    }
}

/// Requested window into the sorted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// 1-based page number, clamped on projection.
    pub page: usize,
    /// Rows per page when not showing all.
    pub page_size: usize,
    /// Ignore `page_size` and return every row.
    pub show_all: bool,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            show_all: false,
        }
    }
}

/// Everything the projection needs besides data and selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Active sort.
    pub sort: SortSpec,
    /// Active page window.
    pub page: PageRequest,
    /// Case-insensitive symbol substring filter.
    pub filter: Option<String>,
    /// Explicit visible columns; `None` derives them from the data.
    pub columns: Option<Vec<String>>,
}

// =============================================================================
// Output
// =============================================================================

/// Page metadata of a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// Effective 1-based page after clamping.
    pub page: usize,
    /// Total number of pages (at least one).
    pub page_count: usize,
    /// Effective page size.
    pub page_size: usize,
    /// Rows after filtering, across all pages.
    pub total_rows: usize,
    /// Whether "show all" was in effect.
    pub show_all: bool,
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectedRow {
    /// Row symbol.
    pub symbol: Symbol,
    /// Selection flag.
    pub selected: bool,
    /// Formatted cells, one per projected column.
    pub cells: Vec<String>,
}

/// Rows ready to render plus view metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Projection {
    /// Column names matching each row's `cells`.
    pub columns: Vec<String>,
    /// Rows on the current page.
    pub rows: Vec<ProjectedRow>,
    /// Sort that produced the ordering.
    pub sort: SortSpec,
    /// Page metadata.
    pub page: PageInfo,
    /// Selected symbols across the whole universe.
    pub selected_count: usize,
    /// Every row on the page is selected (false for an empty page).
    pub page_all_selected: bool,
}

// =============================================================================
// Column Resolution
// =============================================================================

/// Value for a column together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// The raw value.
    pub value: FieldValue,
    /// Came from the derived (score) group.
    pub derived: bool,
}

/// Resolve a column for a row, falling back to the quote cache.
#[must_use]
pub fn resolve(
    row: &InstrumentRow,
    quotes: &HashMap<Symbol, LiveQuote>,
    column: &str,
) -> Option<Resolved> {
    if column.eq_ignore_ascii_case("symbol") {
        return Some(Resolved {
            value: FieldValue::Text(row.symbol.clone()),
            derived: false,
        });
    }

    if let Some(score) = row.derived_fields.get(column) {
        return Some(Resolved {
            value: FieldValue::Number(*score),
            derived: true,
        });
    }

    let own = row
        .live_fields
        .get(column)
        .filter(|v| !v.is_empty())
        .or_else(|| row.static_fields.get(column).filter(|v| !v.is_empty()));
    if let Some(value) = own {
        return Some(Resolved {
            value: value.clone(),
            derived: false,
        });
    }

    if is_live_quote_column(column) {
        return quotes
            .get(&row.symbol)
            .and_then(|q| q.value(column))
            .map(|value| Resolved {
                value,
                derived: false,
            });
    }

    None
}

/// Format a value with fixed precision for numbers, verbatim for text.
#[must_use]
pub fn format_value(value: &FieldValue, precision: usize) -> String {
    match value {
        FieldValue::Number(n) if n.is_finite() => format!("{n:.precision$}"),
        FieldValue::Number(_) => NO_VALUE.to_string(),
        FieldValue::Text(s) => s.clone(),
    }
}

/// Resolve and format a single cell.
#[must_use]
pub fn render_cell(row: &InstrumentRow, quotes: &HashMap<Symbol, LiveQuote>, column: &str) -> String {
    resolve(row, quotes, column).map_or_else(
        || NO_VALUE.to_string(),
        |r| {
            let precision = if r.derived {
                SCORE_PRECISION
            } else {
                DEFAULT_PRECISION
            };
            format_value(&r.value, precision)
        },
    )
}

// =============================================================================
// Sorting
// =============================================================================

fn sort_text(value: Option<&FieldValue>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

/// Compare two optional values: numeric when both parse, lexicographic on
/// their text when neither does. A number sorts before text so the ordering
/// stays total on mixed columns. Missing values compare as empty text.
#[must_use]
pub fn compare_values(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a.and_then(FieldValue::as_number), b.and_then(FieldValue::as_number)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => sort_text(a).cmp(&sort_text(b)),
    }
}

/// Stable sort of rows by the sort key and direction. Ties keep their prior order.
pub fn sort_rows(rows: &mut [&InstrumentRow], quotes: &HashMap<Symbol, LiveQuote>, sort: &SortSpec) {
    let Some(key) = sort.key.as_deref() else {
        return;
    };

    rows.sort_by(|a, b| {
        let left = resolve(a, quotes, key).map(|r| r.value);
        let right = resolve(b, quotes, key).map(|r| r.value);
        let ordering = compare_values(left.as_ref(), right.as_ref());
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

// =============================================================================
// Pagination
// =============================================================================

/// Compute the effective page and the index range it covers.
#[must_use]
pub fn paginate(total_rows: usize, request: &PageRequest) -> (PageInfo, Range<usize>) {
    if request.show_all {
        let info = PageInfo {
            page: 1,
            page_count: 1,
            page_size: total_rows,
            total_rows,
            show_all: true,
        };
        return (info, 0..total_rows);
    }

    let page_size = request.page_size.max(1);
    let page_count = total_rows.div_ceil(page_size).max(1);
    let page = request.page.clamp(1, page_count);
    let start = ((page - 1) * page_size).min(total_rows);
    let end = (start + page_size).min(total_rows);

    let info = PageInfo {
        page,
        page_count,
        page_size,
        total_rows,
        show_all: false,
    };
    (info, start..end)
}

// =============================================================================
// Projection
// =============================================================================

/// Union of column names in load order: static, then live, then quote
/// backed columns (when any quote is cached), then derived.
#[must_use]
pub fn default_columns(snapshot: &StoreSnapshot) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    let mut push = |name: &str| {
        if seen.insert(name.to_string()) {
            columns.push(name.to_string());
        }
    };

    for row in &snapshot.rows {
        for key in row.static_fields.keys() {
            push(key.as_str());
        }
    }
    for row in &snapshot.rows {
        for key in row.live_fields.keys() {
            push(key.as_str());
        }
    }
    if !snapshot.quotes.is_empty() {
        for column in LIVE_QUOTE_COLUMNS.iter().filter(|c| **c != "price") {
            push(*column);
        }
    }
    for row in &snapshot.rows {
        for key in row.derived_fields.keys() {
            push(key.as_str());
        }
    }

    columns
}

fn matches_filter(symbol: &str, filter: Option<&str>) -> bool {
    match filter.map(str::trim) {
        None | Some("") => true,
        Some(needle) => symbol.to_lowercase().contains(&needle.to_lowercase()),
    }
}

/// Build the rows to render from a snapshot, the selection and the view.
#[must_use]
pub fn project(snapshot: &StoreSnapshot, selection: &SelectionTracker, view: &ViewState) -> Projection {
    let mut rows: Vec<&InstrumentRow> = snapshot
        .rows
        .iter()
        .filter(|r| matches_filter(&r.symbol, view.filter.as_deref()))
        .collect();

    sort_rows(&mut rows, &snapshot.quotes, &view.sort);

    let (page, range) = paginate(rows.len(), &view.page);
    let columns = view
        .columns
        .clone()
        .unwrap_or_else(|| default_columns(snapshot));

    let page_rows: Vec<ProjectedRow> = rows[range]
        .iter()
        .map(|row| ProjectedRow {
            symbol: row.symbol.clone(),
            selected: selection.contains(&row.symbol),
            cells: columns
                .iter()
                .map(|c| render_cell(row, &snapshot.quotes, c))
                .collect(),
        })
        .collect();

    let page_all_selected = !page_rows.is_empty() && page_rows.iter().all(|r| r.selected);

    Projection {
        columns,
        rows: page_rows,
        sort: view.sort.clone(),
        page,
        selected_count: selection.len(),
        page_all_selected,
    }
}

// =============================================================================
// Tests
// =============================================================================
