//! Scanner Sync Binary
//!
//! Runs the synchronization core headless: loads the universe, keeps the
//! feed connected, refreshes scores and serves health and metrics.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin scanner-sync
//! ```
//!
//! # Environment Variables
//!
//! - `SCANNER_FEED_URL`: Push feed WebSocket endpoint
//! - `SCANNER_SCORING_URL`: Scoring service endpoint
//! - `SCANNER_STATUS_URL`: Connection-status endpoint
//! - `SCANNER_UNIVERSE_CSV`: CSV file loaded at startup (optional)
//! - `SCANNER_SCORE_INTERVAL_MS`: Score refresh interval (default: 2000)
//! - `SCANNER_STATUS_POLL_SECS`: Status poll interval (default: 5)
//! - `SCANNER_HTTP_TIMEOUT_SECS`: HTTP request timeout (default: 10)
//! - `SCANNER_PAGE_SIZE`: Rows per page (default: 50)
//! - `SCANNER_HEALTH_PORT`: Health check HTTP port (default: 8083)
//! - `OTEL_ENABLED`: Export spans over OTLP (default: false)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use scanner_sync::application::ports::TradeEventSink;
use scanner_sync::infrastructure::broadcast::TradeEventHub;
use scanner_sync::infrastructure::http::{HttpScoringClient, HttpStatusProbe};
use scanner_sync::infrastructure::telemetry;
use scanner_sync::infrastructure::universe::CsvUniverse;
use scanner_sync::{
    FeedClient, FeedSupervisor, HealthServer, HealthServerState, InstrumentStore,
    ReconnectConfig, ScannerConfig, ScannerCore, ScoreRefresher, StatusBoard, StatusMonitor,
    init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting scanner sync");

    let _metrics_handle = init_metrics();

    let config = ScannerConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    // Shared state
    let store = Arc::new(InstrumentStore::new());
    let status = Arc::new(StatusBoard::new());
    let trade_events = Arc::new(TradeEventHub::with_defaults());

    let feed = FeedClient::new(
        Arc::clone(&store),
        Arc::clone(&trade_events) as Arc<dyn TradeEventSink>,
        Arc::clone(&status),
    );
    let core = Arc::new(ScannerCore::new(
        Arc::clone(&store),
        Arc::clone(&status),
        Arc::new(feed.clone()),
        config.view.page_size,
    ));

    if let Some(path) = &config.universe_csv {
        match core.load_from(&CsvUniverse::new(path)) {
            Ok(summary) => tracing::info!(
                path = %path.display(),
                rows = summary.loaded,
                duplicates = summary.duplicates,
                "Universe loaded"
            ),
            Err(e) => tracing::error!(path = %path.display(), error = %e, "Universe load failed"),
        }
    }

    // Background tasks
    let supervisor = FeedSupervisor::new(
        feed,
        config.feed.url.clone(),
        ReconnectConfig::from(&config.feed),
    )
    .spawn(&shutdown_token);

    let scoring = HttpScoringClient::new(config.scoring.url.clone(), config.scoring.timeout)?;
    let refresher = ScoreRefresher::new(
        Arc::clone(&store),
        Arc::new(scoring),
        config.scoring.interval,
    )
    .spawn(&shutdown_token);

    let probe = HttpStatusProbe::new(config.status.url.clone(), config.scoring.timeout)?;
    let monitor = StatusMonitor::new(
        Arc::new(probe),
        Arc::clone(&status),
        config.status.poll_interval,
    )
    .spawn(&shutdown_token);

    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&core),
    ));
    let health_server = HealthServer::new(
        config.server.health_port,
        health_state,
        shutdown_token.clone(),
    );
    let health_task = tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    tracing::info!("Scanner sync ready");

    await_shutdown(shutdown_token).await;

    let stopped = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        refresher.stop().await;
        monitor.stop().await;
        supervisor.stop().await;
        if let Err(e) = health_task.await {
            tracing::warn!(error = %e, "Health server task failed");
        }
    })
    .await;

    if stopped.is_err() {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Shutdown timed out"
        );
    }

    tracing::info!("Scanner sync stopped");
    Ok(())
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &ScannerConfig) {
    tracing::info!(
        health_port = config.server.health_port,
        page_size = config.view.page_size,
        score_interval_ms = config.scoring.interval.as_millis(),
        status_poll_secs = config.status.poll_interval.as_secs(),
        "Configuration loaded"
    );
    tracing::debug!(
        feed_url = %config.feed.url,
        scoring_url = %config.scoring.url,
        status_url = %config.status.url,
        "Service endpoints"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
