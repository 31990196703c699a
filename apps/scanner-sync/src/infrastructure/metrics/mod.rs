//! Prometheus Metrics Module
//!
//! Exposes synchronization metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Store**: loaded rows, quotes and derived entries applied or dropped
//! - **Feed**: messages by kind, parse failures, connection state, reconnects
//! - **Refresh**: scoring cycles by outcome and cycle latency
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port. Recording
//! functions are no-ops until [`init_metrics`] installs the recorder.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            let handle = builder
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    // Store
    describe_gauge!("scanner_sync_instrument_rows", "Rows in the instrument store");
    describe_counter!(
        "scanner_sync_quotes_total",
        "Live quotes received, by outcome (applied/dropped)"
    );
    describe_counter!(
        "scanner_sync_derived_entries_total",
        "Derived entries received, by outcome (applied/dropped)"
    );

    // Feed
    describe_counter!(
        "scanner_sync_feed_messages_total",
        "Feed messages received by kind"
    );
    describe_counter!(
        "scanner_sync_feed_parse_failures_total",
        "Feed messages that failed to parse"
    );
    describe_gauge!(
        "scanner_sync_feed_connected",
        "1 while the push feed is connected"
    );
    describe_counter!(
        "scanner_sync_feed_reconnects_total",
        "Feed reconnection attempts"
    );

    // Refresh
    describe_counter!(
        "scanner_sync_refresh_cycles_total",
        "Score refresh cycles by outcome"
    );
    describe_histogram!(
        "scanner_sync_refresh_cycle_seconds",
        "Duration of completed score refresh cycles"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Outcome labels for a score refresh tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Response merged into the store.
    Applied,
    /// Remote call failed or returned garbage.
    Failed,
    /// Previous cycle still in flight.
    SkippedInFlight,
    /// Store was empty.
    SkippedEmpty,
    /// Stopped before the result could be applied.
    Cancelled,
}

impl CycleOutcome {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Failed => "failed",
            Self::SkippedInFlight => "skipped_in_flight",
            Self::SkippedEmpty => "skipped_empty",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Update the loaded row count.
#[allow(clippy::cast_precision_loss)]
pub fn set_instrument_rows(count: usize) {
    gauge!("scanner_sync_instrument_rows").set(count as f64);
}

/// Record a live quote and whether it hit a known symbol.
pub fn record_quote(applied: bool) {
    let outcome = if applied { "applied" } else { "dropped" };
    counter!("scanner_sync_quotes_total", "outcome" => outcome).increment(1);
}

/// Record a derived batch.
pub fn record_derived_batch(applied: usize, dropped: usize) {
    counter!("scanner_sync_derived_entries_total", "outcome" => "applied").increment(applied as u64);
    counter!("scanner_sync_derived_entries_total", "outcome" => "dropped").increment(dropped as u64);
}

/// Record a feed message by kind.
pub fn record_feed_message(kind: &str) {
    counter!(
        "scanner_sync_feed_messages_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record a feed message that failed to parse.
pub fn record_parse_failure() {
    counter!("scanner_sync_feed_parse_failures_total").increment(1);
}

/// Update the feed connection gauge.
pub fn set_feed_connected(connected: bool) {
    gauge!("scanner_sync_feed_connected").set(if connected { 1.0 } else { 0.0 });
}

/// Record a feed reconnection attempt.
pub fn record_reconnect() {
    counter!("scanner_sync_feed_reconnects_total").increment(1);
}

/// Record a refresh tick outcome.
pub fn record_cycle(outcome: CycleOutcome) {
    counter!(
        "scanner_sync_refresh_cycles_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record refresh cycle duration.
pub fn record_cycle_duration(duration: Duration) {
    histogram!("scanner_sync_refresh_cycle_seconds").record(duration.as_secs_f64());
}

// =============================================================================
// Tests
// =============================================================================
