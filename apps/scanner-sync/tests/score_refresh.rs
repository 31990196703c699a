//! Score Refresher Integration Tests
//!
//! Runs the refresher on real timers against counting scoring doubles.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use scanner_sync::application::ports::ScoringPort;
use scanner_sync::domain::instrument::DerivedFields;
use scanner_sync::{DerivedEntry, InstrumentRow, InstrumentStore, ScoreRefresher, TransientFetchError};
use tokio_util::sync::CancellationToken;

/// Scoring double that tracks how many calls overlap.
#[derive(Default)]
struct CountingScorer {
    delay: Duration,
    active: AtomicUsize,
    max_active: AtomicUsize,
    calls: AtomicUsize,
    fail: bool,
}

impl CountingScorer {
    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ScoringPort for CountingScorer {
    async fn score(&self, rows: Vec<InstrumentRow>) -> Result<Vec<DerivedEntry>, TransientFetchError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            return Err(TransientFetchError::Transport("connection refused".to_string()));
        }

        #[allow(clippy::cast_precision_loss)]
        let value = call as f64;
        Ok(rows
            .into_iter()
            .map(|row| DerivedEntry::new(row.symbol, DerivedFields::from([("momentum".to_string(), value)])))
            .collect())
    }
}

fn loaded_store() -> Arc<InstrumentStore> {
    let store = Arc::new(InstrumentStore::new());
    store
        .load(vec![
            InstrumentRow::new("AAPL").with_static("sector", "Tech"),
            InstrumentRow::new("XOM").with_static("sector", "Energy"),
        ])
        .unwrap();
    store
}

#[tokio::test]
async fn slow_scoring_never_overlaps() {
    let store = loaded_store();
    let scorer = Arc::new(CountingScorer::slow(Duration::from_millis(60)));
    let root = CancellationToken::new();

    let handle = ScoreRefresher::new(
        Arc::clone(&store),
        Arc::clone(&scorer) as Arc<dyn ScoringPort>,
        Duration::from_millis(10),
    )
    .spawn(&root);

    tokio::time::sleep(Duration::from_millis(400)).await;
    handle.stop().await;

    assert_eq!(scorer.max_active.load(Ordering::SeqCst), 1);
    assert!(scorer.calls.load(Ordering::SeqCst) >= 2);
    assert_eq!(scorer.active.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn scores_are_merged_without_touching_static_fields() {
    let store = loaded_store();
    let scorer = Arc::new(CountingScorer::slow(Duration::from_millis(1)));
    let root = CancellationToken::new();

    let handle = ScoreRefresher::new(
        Arc::clone(&store),
        Arc::clone(&scorer) as Arc<dyn ScoringPort>,
        Duration::from_millis(20),
    )
    .spawn(&root);

    tokio::time::timeout(Duration::from_secs(3), async {
        while store.snapshot().rows.iter().any(|r| r.derived_fields.is_empty()) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("scores never arrived");
    handle.stop().await;

    let snapshot = store.snapshot();
    for row in &snapshot.rows {
        assert!(row.derived_fields.contains_key("momentum"));
        assert!(row.static_fields.contains_key("sector"));
        assert!(row.live_fields.is_empty());
    }
}

#[tokio::test]
async fn failures_keep_previous_state() {
    let store = loaded_store();
    let before = store.snapshot();
    let scorer = Arc::new(CountingScorer {
        fail: true,
        ..CountingScorer::default()
    });
    let root = CancellationToken::new();

    let handle = ScoreRefresher::new(
        Arc::clone(&store),
        Arc::clone(&scorer) as Arc<dyn ScoringPort>,
        Duration::from_millis(10),
    )
    .spawn(&root);

    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.stop().await;

    assert!(scorer.calls.load(Ordering::SeqCst) >= 1);
    assert_eq!(store.snapshot().rows, before.rows);
}

#[tokio::test]
async fn no_calls_after_stop() {
    let store = loaded_store();
    let scorer = Arc::new(CountingScorer::slow(Duration::from_millis(5)));
    let root = CancellationToken::new();

    let handle = ScoreRefresher::new(
        Arc::clone(&store),
        Arc::clone(&scorer) as Arc<dyn ScoringPort>,
        Duration::from_millis(10),
    )
    .spawn(&root);

    tokio::time::sleep(Duration::from_millis(60)).await;
    handle.stop().await;
    let calls = scorer.calls.load(Ordering::SeqCst);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(scorer.calls.load(Ordering::SeqCst), calls);
}

#[tokio::test]
async fn parent_cancellation_stops_the_loop() {
    let store = loaded_store();
    let scorer = Arc::new(CountingScorer::slow(Duration::from_millis(1)));
    let root = CancellationToken::new();

    let handle = ScoreRefresher::new(
        Arc::clone(&store),
        Arc::clone(&scorer) as Arc<dyn ScoringPort>,
        Duration::from_millis(10),
    )
    .spawn(&root);

    root.cancel();
    tokio::time::timeout(Duration::from_secs(1), async {
        while !handle.is_finished() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("refresher did not stop on parent cancellation");
}
