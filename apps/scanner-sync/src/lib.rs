#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Scanner Sync - Live Market Data Synchronization Core
//!
//! Keeps the scanner terminal's instrument table consistent while three
//! independent sources update it: a bulk-loaded universe, a WebSocket push
//! feed of quotes and trade events, and a periodically polled scoring
//! service. The view reads immutable snapshots and projects them into a
//! sorted, filtered, paginated page.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Instrument table state and pure view logic
//!   - `store`: authoritative instrument store with snapshot reads
//!   - `selection`: selected-symbol tracking with reconciliation
//!   - `projection`: sorting, pagination and cell formatting
//!   - `status`: feed and broker connectivity flags
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: scoring, status probe, universe source, trade event sink
//!   - `services`: `ScannerCore` façade, score refresher, status monitor
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `feed`: WebSocket client and reconnect supervisor
//!   - `http`: scoring and status clients
//!   - `universe`: CSV universe loader
//!   - `broadcast`: trade event channels
//!   - `config`, `health`, `metrics`, `telemetry`
//!
//! # Data Flow
//!
//! ```text
//! CSV universe ──── load ─────────┐
//!                                 ▼
//! Push feed WS ── quotes ──► InstrumentStore ──► snapshot ──► project ──► view
//!                                 ▲
//! Scoring HTTP ◄── rows ── ScoreRefresher ── derived scores ─┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Instrument state and view logic with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

/// Error taxonomy shared across layers.
pub mod error;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::instrument::{DerivedEntry, FieldValue, InstrumentRow, LiveQuote, Symbol};
pub use domain::projection::{PageRequest, Projection, SortDirection, SortSpec, ViewState};
pub use domain::selection::SelectionTracker;
pub use domain::status::{ConnectionStatus, StatusBoard};
pub use domain::store::{InstrumentStore, StoreSnapshot};

// Services
pub use application::services::{RefresherHandle, ScannerCore, ScoreRefresher, StatusMonitor};

// Errors
pub use error::{ConnectionError, ScannerError, TransientFetchError, ValidationError};

// Infrastructure config
pub use infrastructure::config::{ConfigError, FeedSettings, ScannerConfig};

// Feed client
pub use infrastructure::feed::{FeedClient, FeedState, FeedSupervisor, ReconnectConfig};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
