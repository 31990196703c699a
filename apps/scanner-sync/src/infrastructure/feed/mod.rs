//! Push Feed Adapter
//!
//! WebSocket subscriber for the live feed: JSON codec, connection client,
//! backoff policy and the optional reconnect supervisor.

pub mod client;
pub mod codec;
pub mod messages;
pub mod reconnect;
pub mod supervisor;

pub use client::{ConnectivityEvent, FeedClient, FeedState};
pub use codec::{CodecError, FeedCodec};
pub use messages::{Envelope, FeedMessage, QuotePayload, SubscribeRequest};
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
pub use supervisor::FeedSupervisor;
