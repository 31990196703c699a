//! Subscription Port (Driven Port)
//!
//! Declares which symbols the push feed should deliver.

use crate::domain::instrument::Symbol;

/// Port for declaring symbol interest.
///
/// Implementations only hand the request off; they never wait on I/O.
pub trait SubscriptionPort: Send + Sync {
    /// Replace the current interest with `symbols`.
    fn subscribe(&self, symbols: Vec<Symbol>);
}

/// Subscription port that discards every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSubscription;

impl SubscriptionPort for NoOpSubscription {
    fn subscribe(&self, _symbols: Vec<Symbol>) {}
}
