//! Application Ports (Driven)
//!
//! Interfaces the synchronization core uses to reach external systems.
//! Infrastructure adapters implement them; tests substitute doubles.
//!
//! - `ScoringPort`: remote scoring service
//! - `StatusProbe`: connection-status endpoint
//! - `UniverseSource`: bulk instrument source
//! - `TradeEventSink`: consumer of position/order/fill notifications
//! - `SubscriptionPort`: declares symbol interest on the push feed

mod scoring_port;
mod status_probe_port;
mod subscription_port;
mod trade_event_port;
mod universe_source_port;

#[cfg(test)]
pub use scoring_port::MockScoringPort;
pub use scoring_port::ScoringPort;
#[cfg(test)]
pub use status_probe_port::MockStatusProbe;
pub use status_probe_port::StatusProbe;
pub use subscription_port::{NoOpSubscription, SubscriptionPort};
pub use trade_event_port::{NoOpTradeEventSink, TradeEvent, TradeEventKind, TradeEventSink};
pub use universe_source_port::{StaticUniverse, UniverseSource};
