//! Domain Layer - Instrument table state and pure view logic.
//!
//! Everything here is synchronous and free of I/O. Shared state uses
//! `parking_lot` locks so it can be read from any task or thread.

/// Instrument rows, live quotes and derived score entries.
pub mod instrument;

/// Sorting, pagination and column resolution.
pub mod projection;

/// Selected-symbol tracking.
pub mod selection;

/// Feed and broker connectivity flags.
pub mod status;

/// Authoritative instrument store.
pub mod store;
