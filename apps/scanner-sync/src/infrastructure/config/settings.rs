//! Scanner Configuration Settings
//!
//! Configuration types for the synchronization service, loaded from
//! environment variables with typed defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::projection::DEFAULT_PAGE_SIZE;

/// Push feed connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSettings {
    /// WebSocket endpoint.
    pub url: String,
    /// Initial reconnection delay.
    pub reconnect_delay_initial: Duration,
    /// Maximum reconnection delay.
    pub reconnect_delay_max: Duration,
    /// Reconnection delay multiplier for exponential backoff.
    pub reconnect_delay_multiplier: f64,
    /// Maximum reconnection attempts before giving up (0 = unlimited).
    pub max_reconnect_attempts: u32,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8765/ws".to_string(),
            reconnect_delay_initial: Duration::from_millis(500),
            reconnect_delay_max: Duration::from_secs(30),
            reconnect_delay_multiplier: 2.0,
            max_reconnect_attempts: 0, // Unlimited
        }
    }
}

/// Scoring service settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringSettings {
    /// Scoring endpoint.
    pub url: String,
    /// Refresh interval.
    pub interval: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000/score".to_string(),
            interval: Duration::from_millis(2_000),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Connection-status endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSettings {
    /// Status endpoint.
    pub url: String,
    /// Poll interval.
    pub poll_interval: Duration,
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000/status".to_string(),
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// View defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSettings {
    /// Rows per page.
    pub page_size: usize,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Server port settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSettings {
    /// Health check HTTP port.
    pub health_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { health_port: 8083 }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScannerConfig {
    /// Push feed settings.
    pub feed: FeedSettings,
    /// Scoring service settings.
    pub scoring: ScoringSettings,
    /// Status endpoint settings.
    pub status: StatusSettings,
    /// View defaults.
    pub view: ViewSettings,
    /// Server ports.
    pub server: ServerSettings,
    /// CSV file to load at startup, if any.
    pub universe_csv: Option<PathBuf>,
}

impl ScannerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if an interval or the page size is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if an interval or the page size is zero.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let defaults = Self::default();

        let feed = FeedSettings {
            url: env.string("SCANNER_FEED_URL", &defaults.feed.url),
            reconnect_delay_initial: env.duration_millis(
                "SCANNER_RECONNECT_DELAY_INITIAL_MS",
                defaults.feed.reconnect_delay_initial,
            ),
            reconnect_delay_max: env.duration_secs(
                "SCANNER_RECONNECT_DELAY_MAX_SECS",
                defaults.feed.reconnect_delay_max,
            ),
            reconnect_delay_multiplier: env.parse(
                "SCANNER_RECONNECT_DELAY_MULTIPLIER",
                defaults.feed.reconnect_delay_multiplier,
            ),
            max_reconnect_attempts: env.parse(
                "SCANNER_MAX_RECONNECT_ATTEMPTS",
                defaults.feed.max_reconnect_attempts,
            ),
        };

        let scoring = ScoringSettings {
            url: env.string("SCANNER_SCORING_URL", &defaults.scoring.url),
            interval: env.duration_millis("SCANNER_SCORE_INTERVAL_MS", defaults.scoring.interval),
            timeout: env.duration_secs("SCANNER_HTTP_TIMEOUT_SECS", defaults.scoring.timeout),
        };

        let status = StatusSettings {
            url: env.string("SCANNER_STATUS_URL", &defaults.status.url),
            poll_interval: env
                .duration_secs("SCANNER_STATUS_POLL_SECS", defaults.status.poll_interval),
        };

        let view = ViewSettings {
            page_size: env.parse("SCANNER_PAGE_SIZE", defaults.view.page_size),
        };

        let server = ServerSettings {
            health_port: env.parse("SCANNER_HEALTH_PORT", defaults.server.health_port),
        };

        let universe_csv = env
            .get("SCANNER_UNIVERSE_CSV")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let config = Self {
            feed,
            scoring,
            status,
            view,
            server,
            universe_csv,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the services cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending variable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("SCANNER_SCORE_INTERVAL_MS", self.scoring.interval.is_zero()),
            ("SCANNER_STATUS_POLL_SECS", self.status.poll_interval.is_zero()),
            ("SCANNER_HTTP_TIMEOUT_SECS", self.scoring.timeout.is_zero()),
            ("SCANNER_PAGE_SIZE", self.view.page_size == 0),
        ];

        match checks.into_iter().find(|(_, invalid)| *invalid) {
            Some((key, _)) => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                reason: "must be greater than zero".to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable has a value the service cannot use.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// What is wrong with it.
        reason: String,
    },
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    fn parse<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn duration_secs(&self, key: &str, default: Duration) -> Duration {
        self.get(key)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(default, Duration::from_secs)
    }

    fn duration_millis(&self, key: &str, default: Duration) -> Duration {
        self.get(key)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(default, Duration::from_millis)
    }
}
