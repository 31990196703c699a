//! Application Services
//!
//! - `ScannerCore`: the façade the terminal talks to
//! - `ScoreRefresher`: periodic scoring cycle
//! - `StatusMonitor`: periodic connection-status poll

mod scanner;
mod score_refresher;
mod status_monitor;
mod task;

pub use scanner::ScannerCore;
pub use score_refresher::{RefresherHandle, ScoreRefresher};
pub use status_monitor::StatusMonitor;
pub use task::TaskHandle;
