//! Status Probe Port (Driven Port)

use async_trait::async_trait;

use crate::domain::status::ConnectionStatus;
use crate::error::TransientFetchError;

/// Port for polling feed and broker connectivity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// Fetch the current connection status.
    async fn probe(&self) -> Result<ConnectionStatus, TransientFetchError>;
}
