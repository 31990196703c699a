//! HTTP Adapters
//!
//! reqwest clients for the remote scoring service and the connection-status
//! endpoint. Neither retries: a failed call is a skipped cycle.

mod scoring;
mod status;

pub use scoring::{HttpScoringClient, ScoreRequest, ScoreRequestRow, ScoreResponse, ScoreResult};
pub use status::HttpStatusProbe;

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::TransientFetchError;

/// Longest error body kept in `TransientFetchError::Status`.
const MAX_ERROR_BODY: usize = 256;

/// Build a client with the given request timeout.
fn build_client(timeout: Duration) -> Result<Client, TransientFetchError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| TransientFetchError::Transport(e.to_string()))
}

/// Check the status and decode a JSON body.
async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, TransientFetchError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| TransientFetchError::Transport(e.to_string()))?;

    if !status.is_success() {
        let mut body = text;
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        return Err(TransientFetchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&text).map_err(|e| TransientFetchError::Malformed(e.to_string()))
}
