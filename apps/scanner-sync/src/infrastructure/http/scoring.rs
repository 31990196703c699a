//! HTTP Scoring Client
//!
//! POSTs a snapshot to the scoring service:
//!
//! ```json
//! {"rows": [{"symbol": "AAPL", "static_fields": {...}, "live_fields": {...}}]}
//! ```
//!
//! and expects:
//!
//! ```json
//! {"results": [{"symbol": "AAPL", "scores": {"momentum": 1.23}}]}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{build_client, read_json};
use crate::application::ports::ScoringPort;
use crate::domain::instrument::{DerivedEntry, DerivedFields, FieldMap, InstrumentRow, Symbol};
use crate::error::TransientFetchError;

/// One row sent for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequestRow {
    /// Row symbol.
    pub symbol: Symbol,
    /// Static attributes.
    pub static_fields: FieldMap,
    /// Live attributes.
    pub live_fields: FieldMap,
}

/// Request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRequest {
    /// Rows to score.
    pub rows: Vec<ScoreRequestRow>,
}

impl From<Vec<InstrumentRow>> for ScoreRequest {
    fn from(rows: Vec<InstrumentRow>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|r| ScoreRequestRow {
                    symbol: r.symbol,
                    static_fields: r.static_fields,
                    live_fields: r.live_fields,
                })
                .collect(),
        }
    }
}

/// Scores for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Scored symbol.
    pub symbol: Symbol,
    /// Score name to value.
    #[serde(default)]
    pub scores: DerivedFields,
}

/// Response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    /// Per-symbol results.
    pub results: Vec<ScoreResult>,
}

/// reqwest implementation of [`ScoringPort`].
#[derive(Debug, Clone)]
pub struct HttpScoringClient {
    client: Client,
    url: String,
}

impl HttpScoringClient {
    /// Create a client posting to `url`.
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
impl ScoringPort for HttpScoringClient {
    async fn score(&self, rows: Vec<InstrumentRow>) -> Result<Vec<DerivedEntry>, TransientFetchError> {
        let request = ScoreRequest::from(rows);
        tracing::trace!(rows = request.rows.len(), url = %self.url, "Posting scoring request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| TransientFetchError::Transport(e.to_string()))?;

        let body: ScoreResponse = read_json(response).await?;

        Ok(body
            .results
            .into_iter()
            .map(|r| DerivedEntry::new(r.symbol, r.scores))
            .collect())
    }
}
