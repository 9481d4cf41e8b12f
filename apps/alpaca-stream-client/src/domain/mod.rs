//! Domain Layer - Core streaming types and business logic.
//!
//! This layer contains the core domain types for market data streaming
//! with no I/O. All types here are pure Rust with serialization support.

/// Connection lifecycle states and client-facing stream errors.
pub mod connection;

/// Market data records (trades, quotes, bars).
pub mod streaming;

/// Tracked channel subscriptions.
pub mod subscription;
