//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer.

/// Broadcast channel adapter for trade events.
pub mod broadcast;

/// Configuration loading.
pub mod config;

/// Push feed WebSocket client and reconnect supervisor.
pub mod feed;

/// Health check HTTP endpoint.
pub mod health;

/// HTTP adapters for the scoring and status services.
pub mod http;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// OpenTelemetry tracing integration.
pub mod telemetry;

/// CSV universe loader.
pub mod universe;
