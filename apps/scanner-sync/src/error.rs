//! Error Types
//!
//! The three failure classes of the synchronization core. None of them is
//! fatal: each degrades to "last known good state persists".
//!
//! - `ValidationError`: malformed load input, load aborted
//! - `ConnectionError`: feed connect failure, surfaced as status
//! - `TransientFetchError`: scoring cycle or single message failure, skipped

/// Malformed bulk-load input. The previous store contents are retained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A row has an empty or whitespace-only symbol.
    #[error("row {index} has an empty symbol")]
    EmptySymbol {
        /// Position of the offending row in the load input.
        index: usize,
    },

    /// The bulk source could not be read or parsed.
    #[error("invalid universe source: {0}")]
    InvalidSource(String),
}

/// Feed connection failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// The WebSocket handshake failed.
    #[error("failed to connect to {endpoint}: {reason}")]
    ConnectFailed {
        /// Endpoint that was dialed.
        endpoint: String,
        /// Transport error text.
        reason: String,
    },

    /// A connection attempt is already running.
    #[error("connection attempt already in progress")]
    AlreadyConnecting,
}

/// Failure of a single scoring cycle, status poll or inbound message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransientFetchError {
    /// Network-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Remote returned a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// Response or message body could not be decoded.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Any error surfaced by the synchronization core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScannerError {
    /// Load input rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Feed connection failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Remote fetch failed.
    #[error(transparent)]
    TransientFetch(#[from] TransientFetchError),
}
