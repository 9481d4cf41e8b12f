//! Port Interfaces
//!
//! Defines the interfaces (ports) for external systems following
//! the Hexagonal Architecture pattern. These are the contracts that
//! infrastructure adapters must implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `Connector` / `Transport`: opens a text-frame socket and reports its
//!   lifecycle as [`TransportEvent`]s
//! - `RecordDecoder`: turns raw data fragments into domain records

use tokio::sync::mpsc;

use crate::domain::streaming::{Bar, Quote, Trade};

// =============================================================================
// Transport
// =============================================================================

/// Errors raised by a transport adapter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The connection is already closed.
    #[error("transport closed")]
    Closed,
}

/// Lifecycle event reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    /// Socket is open and ready for frames.
    Open,
    /// Text frame received.
    Message(String),
    /// Socket closed (or failed to open).
    Close,
}

/// Transport event tagged with the connection that produced it.
///
/// Each `Connector::open` call gets a fresh connection id, so events from
/// an older socket can be told apart from the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    /// Connection id assigned when the transport was opened.
    pub connection: u64,
    /// What happened.
    pub kind: TransportEventKind,
}

/// Channel end a transport uses to report its events.
#[derive(Debug, Clone)]
pub struct EventSink {
    connection: u64,
    tx: mpsc::UnboundedSender<TransportEvent>,
}

impl EventSink {
    /// Create a sink for one connection.
    #[must_use]
    pub const fn new(connection: u64, tx: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self { connection, tx }
    }

    /// Connection id this sink reports for.
    #[must_use]
    pub const fn connection(&self) -> u64 {
        self.connection
    }

    /// Report that the socket opened.
    pub fn open(&self) {
        self.emit(TransportEventKind::Open);
    }

    /// Report a received text frame.
    pub fn message(&self, text: impl Into<String>) {
        self.emit(TransportEventKind::Message(text.into()));
    }

    /// Report that the socket closed.
    pub fn close(&self) {
        self.emit(TransportEventKind::Close);
    }

    fn emit(&self, kind: TransportEventKind) {
        // Receiver gone means the client stopped; nothing left to notify.
        let _ = self.tx.send(TransportEvent {
            connection: self.connection,
            kind,
        });
    }
}

/// An open (or opening) text-frame connection.
pub trait Transport: Send {
    /// Queue a text frame for sending.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection can no longer accept frames.
    fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Close the connection.
    fn close(&mut self);
}

/// Factory for transports.
pub trait Connector: Send {
    /// Transport type produced by this connector.
    type Transport: Transport;

    /// Start opening a connection to `url`.
    ///
    /// The returned transport reports `Open`, `Message` and `Close` through
    /// `events`. A connection that fails to open reports `Close`.
    fn open(&mut self, url: &str, events: EventSink) -> Self::Transport;
}

// =============================================================================
// Record Decoder
// =============================================================================

/// Error decoding a data fragment into a domain record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct DecodeError(pub String);

/// Decodes raw data fragments into domain records.
#[cfg_attr(test, mockall::automock)]
pub trait RecordDecoder: Send {
    /// Decode a `"T":"t"` fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if the fragment is not a well-formed trade.
    fn decode_trade(&self, fragment: &serde_json::Value) -> Result<Trade, DecodeError>;

    /// Decode a `"T":"q"` fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if the fragment is not a well-formed quote.
    fn decode_quote(&self, fragment: &serde_json::Value) -> Result<Quote, DecodeError>;

    /// Decode a `"T":"b"` fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if the fragment is not a well-formed bar.
    fn decode_bar(&self, fragment: &serde_json::Value) -> Result<Bar, DecodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_sink_tags_connection() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EventSink::new(7, tx);

        sink.open();
        sink.message("[]");
        sink.close();

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .inspect(|e| assert_eq!(e.connection, 7))
            .map(|e| e.kind)
            .collect();

        assert_eq!(
            kinds,
            vec![
                TransportEventKind::Open,
                TransportEventKind::Message("[]".to_string()),
                TransportEventKind::Close,
            ]
        );
    }

    #[test]
    fn event_sink_ignores_dropped_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        EventSink::new(1, tx).close();
    }
}
