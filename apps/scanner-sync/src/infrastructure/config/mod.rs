//! Configuration Module
//!
//! Configuration loading for the synchronization service.

mod settings;

pub use settings::{
    ConfigError, FeedSettings, ScannerConfig, ScoringSettings, ServerSettings, StatusSettings,
    ViewSettings,
};
