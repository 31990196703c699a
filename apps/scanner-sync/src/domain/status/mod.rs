//! Connection Status
//!
//! Feed and broker connectivity flags. The board is only written by explicit
//! connect/disconnect outcomes and by status polls, never inferred from
//! message traffic.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Connectivity flags as reported to the view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    /// Push feed connection is up.
    #[serde(default)]
    pub feed_connected: bool,
    /// Broker connection is up.
    #[serde(default)]
    pub broker_connected: bool,
}

impl ConnectionStatus {
    /// Overall health label derived from both flags.
    #[must_use]
    pub const fn health_label(&self) -> &'static str {
        match (self.feed_connected, self.broker_connected) {
            (true, true) => "healthy",
            (false, false) => "unhealthy",
            _ => "degraded",
        }
    }
}

/// Shared, thread-safe holder of the current [`ConnectionStatus`].
#[derive(Debug, Default)]
pub struct StatusBoard {
    inner: RwLock<ConnectionStatus>,
}

impl StatusBoard {
    /// Create a board with both flags down.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status.
    #[must_use]
    pub fn get(&self) -> ConnectionStatus {
        *self.inner.read()
    }

    /// Record a feed connect or disconnect outcome.
    pub fn set_feed_connected(&self, connected: bool) {
        self.inner.write().feed_connected = connected;
    }

    /// Overwrite both flags with a polled status.
    pub fn replace(&self, status: ConnectionStatus) {
        *self.inner.write() = status;
    }
}
