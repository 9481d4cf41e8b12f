//! Prometheus Metrics Module
//!
//! Counters and gauges for the stream client.
//!
//! # Metrics Categories
//!
//! - **Frames**: inbound text frames from the feed
//! - **Records**: decoded trades, quotes and bars handed to observers
//! - **Errors**: client errors by kind
//! - **Connection**: reconnects scheduled and the current state
//!
//! Recording is a no-op until a recorder is installed, so the client can
//! be embedded without an exporter.

use std::net::SocketAddr;
use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::domain::connection::{ConnectionState, StreamError};

static EXPORTER_INSTALLED: OnceLock<SocketAddr> = OnceLock::new();

/// Install the Prometheus exporter, serving `/metrics` on `addr`.
///
/// Must be called from within a tokio runtime. Later calls are no-ops.
///
/// # Errors
///
/// Returns an error if the recorder or HTTP listener cannot be installed.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    if EXPORTER_INSTALLED.get().is_some() {
        return Ok(());
    }

    PrometheusBuilder::new().with_http_listener(addr).install()?;
    register_metrics();
    let _ = EXPORTER_INSTALLED.set(addr);

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "alpaca_stream_frames_received_total",
        "Total text frames received from the feed"
    );
    describe_counter!(
        "alpaca_stream_records_total",
        "Total decoded records dispatched to observers"
    );
    describe_counter!(
        "alpaca_stream_errors_total",
        "Total client errors by kind"
    );
    describe_counter!(
        "alpaca_stream_reconnects_total",
        "Total reconnection attempts scheduled"
    );
    describe_gauge!(
        "alpaca_stream_connection_state",
        "1 for the current connection state, 0 otherwise"
    );
    describe_gauge!(
        "alpaca_stream_subscriptions",
        "Tracked symbols across all channels"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Metric labels for record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Stock trade.
    Trade,
    /// Stock quote.
    Quote,
    /// Stock bar.
    Bar,
}

impl RecordKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Trade => "trade",
            Self::Quote => "quote",
            Self::Bar => "bar",
        }
    }
}

const fn error_kind(error: &StreamError) -> &'static str {
    match error {
        StreamError::Server { .. } => "server",
        StreamError::UnexpectedMessage { .. } => "unexpected_message",
        StreamError::MalformedFrame(_) => "malformed_frame",
        StreamError::Decode { .. } => "decode",
        StreamError::Transport(_) => "transport",
        StreamError::NotAuthenticated { .. } => "not_authenticated",
    }
}

/// Record an inbound frame.
pub fn record_frame_received() {
    counter!("alpaca_stream_frames_received_total").increment(1);
}

/// Record a record dispatched to observers.
pub fn record_dispatched(kind: RecordKind) {
    counter!("alpaca_stream_records_total", "kind" => kind.as_str()).increment(1);
}

/// Record a client error.
pub fn record_error(error: &StreamError) {
    counter!("alpaca_stream_errors_total", "kind" => error_kind(error)).increment(1);
}

/// Record a scheduled reconnection.
pub fn record_reconnect() {
    counter!("alpaca_stream_reconnects_total").increment(1);
}

/// Mark `state` as the current connection state.
pub fn set_connection_state(state: ConnectionState) {
    for candidate in ConnectionState::ALL {
        let value = if candidate == state { 1.0 } else { 0.0 };
        gauge!("alpaca_stream_connection_state", "state" => candidate.as_str()).set(value);
    }
}

/// Update the tracked subscription count.
#[allow(clippy::cast_precision_loss)]
pub fn set_subscriptions(count: usize) {
    gauge!("alpaca_stream_subscriptions").set(count as f64);
}

// =============================================================================
// Tests
// =============================================================================
