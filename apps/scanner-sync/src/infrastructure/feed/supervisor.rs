//! Feed Supervisor
//!
//! Caller-level reconnect loop around [`FeedClient`]. Connects, waits for
//! the connection to drop, then retries with exponential backoff until the
//! policy gives up or the token is cancelled.

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use super::client::{ConnectivityEvent, FeedClient};
use super::reconnect::{ReconnectConfig, ReconnectPolicy};
use crate::application::services::TaskHandle;
use crate::infrastructure::metrics;

/// Keeps the feed connected.
#[derive(Debug, Clone)]
pub struct FeedSupervisor {
    client: FeedClient,
    endpoint: String,
    reconnect: ReconnectConfig,
}

impl FeedSupervisor {
    /// Create a supervisor for `client` dialing `endpoint`.
    #[must_use]
    pub fn new(client: FeedClient, endpoint: impl Into<String>, reconnect: ReconnectConfig) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            reconnect,
        }
    }

    /// Start the loop. Stopping the handle also disconnects the feed.
    #[must_use]
    pub fn spawn(self, parent: &CancellationToken) -> TaskHandle {
        let cancel = parent.child_token();
        let task = tokio::spawn(self.run(cancel.clone()));
        TaskHandle::new(cancel, task)
    }

    async fn run(self, cancel: CancellationToken) {
        let mut policy = ReconnectPolicy::new(self.reconnect.clone());
        let mut events = self.client.events();

        while !cancel.is_cancelled() {
            match self.client.connect(&self.endpoint).await {
                Ok(()) => {
                    policy.reset();
                    if !wait_for_disconnect(&mut events, &cancel).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Feed connect attempt failed");
                }
            }

            let Some(delay) = policy.next_delay() else {
                tracing::error!(
                    attempts = policy.attempt_count(),
                    "Giving up on feed reconnection"
                );
                break;
            };

            metrics::record_reconnect();
            tracing::info!(
                attempt = policy.attempt_count(),
                delay_ms = delay.as_millis(),
                "Reconnecting to feed"
            );

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        self.client.disconnect();
        tracing::info!("Feed supervisor stopped");
    }
}

/// Wait until the connection drops. Returns `false` if cancelled first.
async fn wait_for_disconnect(
    events: &mut tokio::sync::broadcast::Receiver<ConnectivityEvent>,
    cancel: &CancellationToken,
) -> bool {
    loop {
        tokio::select! {
            () = cancel.cancelled() => return false,
            event = events.recv() => match event {
                Ok(ConnectivityEvent::Disconnected { .. }) => return true,
                Ok(ConnectivityEvent::Connected { .. }) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return false,
            },
        }
    }
}
