//! Score Refresher
//!
//! On every tick: snapshot the store, send it to the scoring service and
//! merge the returned derived fields. At most one request is outstanding;
//! a tick that finds the previous cycle still running is skipped. Failures
//! are logged and the previous scores stay in place.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::task::TaskHandle;
use crate::application::ports::ScoringPort;
use crate::domain::store::InstrumentStore;
use crate::infrastructure::metrics::{self, CycleOutcome};

/// Handle returned by [`ScoreRefresher::spawn`].
pub type RefresherHandle = TaskHandle;

/// Periodic scoring task.
#[derive(Clone)]
pub struct ScoreRefresher {
    store: Arc<InstrumentStore>,
    scoring: Arc<dyn ScoringPort>,
    interval: Duration,
}

impl std::fmt::Debug for ScoreRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreRefresher")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl ScoreRefresher {
    /// Create a refresher ticking every `interval`.
    #[must_use]
    pub fn new(
        store: Arc<InstrumentStore>,
        scoring: Arc<dyn ScoringPort>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            scoring,
            interval,
        }
    }

    /// Start the loop on the runtime.
    ///
    /// The loop stops when the returned handle is stopped or when `parent`
    /// is cancelled.
    #[must_use]
    pub fn spawn(self, parent: &CancellationToken) -> RefresherHandle {
        let cancel = parent.child_token();
        let task = tokio::spawn(self.run(cancel.clone()));
        TaskHandle::new(cancel, task)
    }

    async fn run(self, cancel: CancellationToken) {
        let start = tokio::time::Instant::now() + self.interval;
        let mut interval = tokio::time::interval_at(start, self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            interval_ms = self.interval.as_millis(),
            "Score refresher started"
        );

        let mut in_flight: Option<JoinHandle<CycleOutcome>> = None;

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if in_flight.as_ref().is_some_and(|h| !h.is_finished()) {
                        tracing::debug!("Previous scoring cycle still in flight, skipping tick");
                        metrics::record_cycle(CycleOutcome::SkippedInFlight);
                        continue;
                    }

                    let this = self.clone();
                    let token = cancel.clone();
                    in_flight = Some(tokio::spawn(async move { this.run_cycle(&token).await }));
                }
            }
        }

        if let Some(handle) = in_flight {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Scoring cycle task failed");
            }
        }

        tracing::info!("Score refresher stopped");
    }

    /// Run one scoring cycle.
    ///
    /// The remote call races `cancel`; a result that arrives after
    /// cancellation is discarded.
    #[tracing::instrument(skip_all, fields(cycle_id = %Uuid::new_v4()))]
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> CycleOutcome {
        let outcome = self.cycle(cancel).await;
        metrics::record_cycle(outcome);
        outcome
    }

    async fn cycle(&self, cancel: &CancellationToken) -> CycleOutcome {
        let started = Instant::now();
        let snapshot = self.store.snapshot();
        if snapshot.is_empty() {
            return CycleOutcome::SkippedEmpty;
        }

        let row_count = snapshot.len();
        let result = tokio::select! {
            () = cancel.cancelled() => return CycleOutcome::Cancelled,
            result = self.scoring.score(snapshot.rows) => result,
        };

        match result {
            Ok(entries) => {
                if cancel.is_cancelled() {
                    return CycleOutcome::Cancelled;
                }
                let summary = self.store.apply_derived_batch(entries);
                metrics::record_derived_batch(summary.applied, summary.dropped);
                metrics::record_cycle_duration(started.elapsed());
                tracing::debug!(
                    rows = row_count,
                    applied = summary.applied,
                    dropped = summary.dropped,
                    elapsed_ms = started.elapsed().as_millis(),
                    "Scores refreshed"
                );
                CycleOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    rows = row_count,
                    "Score refresh failed, keeping previous scores"
                );
                CycleOutcome::Failed
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
