//! Status Monitor
//!
//! Polls the connection-status probe and overwrites the shared status
//! board on success. A failed poll keeps the last known status.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::task::TaskHandle;
use crate::application::ports::StatusProbe;
use crate::domain::status::StatusBoard;
use crate::infrastructure::metrics;

/// Periodic connection-status poll.
#[derive(Clone)]
pub struct StatusMonitor {
    probe: Arc<dyn StatusProbe>,
    board: Arc<StatusBoard>,
    interval: Duration,
}

impl std::fmt::Debug for StatusMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusMonitor")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl StatusMonitor {
    /// Create a monitor polling every `interval`.
    #[must_use]
    pub fn new(probe: Arc<dyn StatusProbe>, board: Arc<StatusBoard>, interval: Duration) -> Self {
        Self {
            probe,
            board,
            interval,
        }
    }

    /// Start polling; the first poll happens immediately.
    #[must_use]
    pub fn spawn(self, parent: &CancellationToken) -> TaskHandle {
        let cancel = parent.child_token();
        let task = tokio::spawn(self.run(cancel.clone()));
        TaskHandle::new(cancel, task)
    }

    async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::debug!("Status monitor cancelled");
                    break;
                }
                _ = interval.tick() => {
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = self.poll_once() => {}
                    }
                }
            }
        }
    }

    /// Poll the probe once and update the board on success.
    pub async fn poll_once(&self) {
        match self.probe.probe().await {
            Ok(status) => {
                let previous = self.board.get();
                self.board.replace(status);
                metrics::set_feed_connected(status.feed_connected);
                if previous != status {
                    tracing::info!(
                        feed_connected = status.feed_connected,
                        broker_connected = status.broker_connected,
                        "Connection status changed"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Status poll failed, keeping last known status");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockStatusProbe;
    use crate::domain::status::ConnectionStatus;
    use crate::error::TransientFetchError;

    const UP: ConnectionStatus = ConnectionStatus {
        feed_connected: true,
        broker_connected: true,
    };

    #[tokio::test]
    async fn successful_poll_overwrites_board() {
        let mut probe = MockStatusProbe::new();
        probe.expect_probe().times(1).returning(|| Ok(UP));
        let board = Arc::new(StatusBoard::new());

        let monitor = StatusMonitor::new(Arc::new(probe), Arc::clone(&board), Duration::from_secs(1));
        monitor.poll_once().await;

        assert_eq!(board.get(), UP);
    }

    #[tokio::test]
    async fn failed_poll_keeps_last_status() {
        let mut probe = MockStatusProbe::new();
        probe
            .expect_probe()
            .returning(|| Err(TransientFetchError::Status { status: 503, body: String::new() }));
        let board = Arc::new(StatusBoard::new());
        board.replace(UP);

        let monitor = StatusMonitor::new(Arc::new(probe), Arc::clone(&board), Duration::from_secs(1));
        monitor.poll_once().await;

        assert_eq!(board.get(), UP);
    }

    #[tokio::test]
    async fn spawned_monitor_polls_immediately() {
        let mut probe = MockStatusProbe::new();
        probe.expect_probe().returning(|| Ok(UP));
        let board = Arc::new(StatusBoard::new());

        let handle = StatusMonitor::new(Arc::new(probe), Arc::clone(&board), Duration::from_secs(60))
            .spawn(&CancellationToken::new());

        tokio::time::timeout(Duration::from_secs(1), async {
            while board.get() != UP {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        handle.stop().await;
    }
}
