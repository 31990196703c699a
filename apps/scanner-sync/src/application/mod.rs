//! Application Layer - Use cases and port definitions.
//!
//! This layer wires the domain to external systems through ports and runs
//! the periodic background services.

/// Port interfaces for external systems (scoring, status, feed, sources).
pub mod ports;

/// Façade, score refresher and status monitor.
pub mod services;
