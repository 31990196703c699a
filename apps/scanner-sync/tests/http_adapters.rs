//! HTTP Adapter Integration Tests
//!
//! Exercises the scoring client and status probe against wiremock servers.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use scanner_sync::application::ports::{ScoringPort, StatusProbe};
use scanner_sync::infrastructure::http::{HttpScoringClient, HttpStatusProbe, ScoreRequest};
use scanner_sync::{InstrumentRow, TransientFetchError};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(2);

fn rows() -> Vec<InstrumentRow> {
    vec![
        InstrumentRow::new("AAPL")
            .with_static("sector", "Tech")
            .with_live("price", 187.5)
            .with_derived("momentum", 0.5),
        InstrumentRow::new("XOM").with_static("sector", "Energy"),
    ]
}

// =============================================================================
// Scoring
// =============================================================================

#[tokio::test]
async fn scoring_posts_rows_and_parses_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/score"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"symbol": "AAPL", "scores": {"momentum": 1.23456, "value": 0.1}},
                {"symbol": "XOM", "scores": {"momentum": -0.5}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpScoringClient::new(format!("{}/score", server.uri()), TIMEOUT).unwrap();
    let entries = client.score(rows()).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].symbol, "AAPL");
    assert!((entries[0].scores["momentum"] - 1.23456).abs() < f64::EPSILON);
    assert_eq!(entries[1].scores.len(), 1);

    let received = server.received_requests().await.unwrap();
    let request: ScoreRequest = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(request.rows.len(), 2);
    assert_eq!(request.rows[0].symbol, "AAPL");
    assert!(request.rows[0].static_fields.contains_key("sector"));
    assert!(request.rows[0].live_fields.contains_key("price"));

    let raw: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert!(raw["rows"][0].get("derived_fields").is_none());
}

#[tokio::test]
async fn scoring_error_status_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/score"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model warming up"))
        .mount(&server)
        .await;

    let client = HttpScoringClient::new(format!("{}/score", server.uri()), TIMEOUT).unwrap();
    let err = client.score(rows()).await.unwrap_err();

    match err {
        TransientFetchError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "model warming up");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn scoring_malformed_body_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"results\": oops"))
        .mount(&server)
        .await;

    let client = HttpScoringClient::new(server.uri(), TIMEOUT).unwrap();
    let err = client.score(rows()).await.unwrap_err();

    assert!(matches!(err, TransientFetchError::Malformed(_)));
}

#[tokio::test]
async fn scoring_timeout_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"results": []}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = HttpScoringClient::new(server.uri(), Duration::from_millis(50)).unwrap();
    let err = client.score(rows()).await.unwrap_err();

    assert!(matches!(err, TransientFetchError::Transport(_)));
}

// =============================================================================
// Status
// =============================================================================

#[tokio::test]
async fn status_probe_reads_flags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "feed_connected": true,
            "broker_connected": false
        })))
        .mount(&server)
        .await;

    let probe = HttpStatusProbe::new(format!("{}/status", server.uri()), TIMEOUT).unwrap();
    let status = probe.probe().await.unwrap();

    assert!(status.feed_connected);
    assert!(!status.broker_connected);
}

#[tokio::test]
async fn status_probe_defaults_missing_flags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"broker_connected": true})))
        .mount(&server)
        .await;

    let probe = HttpStatusProbe::new(server.uri(), TIMEOUT).unwrap();
    let status = probe.probe().await.unwrap();

    assert!(!status.feed_connected);
    assert!(status.broker_connected);
}

#[tokio::test]
async fn status_probe_unreachable_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let probe = HttpStatusProbe::new(format!("http://{addr}/status"), TIMEOUT).unwrap();
    let err = probe.probe().await.unwrap_err();

    assert!(matches!(err, TransientFetchError::Transport(_)));
}
