#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Alpaca Stream Client - Resilient Market Data Feed Client
//!
//! Keeps one authenticated connection to Alpaca's v2 market data stream,
//! tracks trade/quote/bar subscriptions across reconnects and dispatches
//! decoded records to registered observers.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Core streaming types
//!   - `connection`: Connection states and client errors
//!   - `streaming`: Market data records (trades, quotes, bars)
//!   - `subscription`: Tracked subscription set
//!
//! - **Application**: Port definitions and services
//!   - `ports`: Transport and record decoder interfaces
//!   - `services`: Event dispatch hub
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `alpaca`: Session state machine, client driver, WebSocket transport
//!   - `config`: Configuration loading
//!   - `metrics`: Prometheus counters
//!   - `telemetry`: Tracing subscriber
//!
//! # Data Flow
//!
//! ```text
//!                 ┌─────────────┐  events   ┌─────────────┐
//! Alpaca WS ◄────►│  Transport  │──────────►│             │──► on_trade
//!                 └─────────────┘           │   Session   │──► on_quote
//!                        ▲         frames   │  (client    │──► on_bar
//!                        └──────────────────│   task)     │──► on_state_change
//! StreamHandle ──── commands ──────────────►│             │──► on_error
//!                                           └─────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core streaming types with no external dependencies.
pub mod domain;

/// Application layer - Port definitions and services.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::connection::{ConnectionState, StreamError};
pub use domain::streaming::{Bar, Quote, Trade};
pub use domain::subscription::{SubscriptionSet, SubscriptionType, Symbol};

// Ports
pub use application::ports::{
    Connector, DecodeError, EventSink, RecordDecoder, Transport, TransportError, TransportEvent,
    TransportEventKind,
};
pub use application::services::EventHub;

// Client
pub use infrastructure::alpaca::{
    AlpacaRecordDecoder, AuthError, ClientStopped, Command, Credentials, ReconnectConfig,
    StreamClient, StreamHandle, WsConnector,
};

// Configuration
pub use infrastructure::config::{ClientConfig, ConfigError, DataFeed};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::init as init_telemetry;
