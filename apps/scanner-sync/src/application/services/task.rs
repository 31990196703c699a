//! Owned handle for a spawned periodic task.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to a background loop. Dropping it does not stop the loop; call
/// [`TaskHandle::stop`] for a deterministic shutdown.
#[derive(Debug)]
pub struct TaskHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TaskHandle {
    pub(crate) const fn new(cancel: CancellationToken, task: JoinHandle<()>) -> Self {
        Self { cancel, task }
    }

    /// Cancel the loop and wait for it (and any in-flight work) to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Background task ended abnormally");
        }
    }

    /// True once the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Token that stops this loop when cancelled.
    #[must_use]
    pub const fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}
