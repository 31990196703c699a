//! HTTP Status Probe
//!
//! GETs `{"feed_connected": bool, "broker_connected": bool}` from the
//! status endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::{build_client, read_json};
use crate::application::ports::StatusProbe;
use crate::domain::status::ConnectionStatus;
use crate::error::TransientFetchError;

/// reqwest implementation of [`StatusProbe`].
#[derive(Debug, Clone)]
pub struct HttpStatusProbe {
    client: Client,
    url: String,
}

impl HttpStatusProbe {
    /// Create a probe polling `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransientFetchError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl StatusProbe for HttpStatusProbe {
    async fn probe(&self) -> Result<ConnectionStatus, TransientFetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| TransientFetchError::Transport(e.to_string()))?;

        read_json(response).await
    }
}
