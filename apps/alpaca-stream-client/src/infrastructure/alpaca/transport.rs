//! WebSocket Transport
//!
//! [`Connector`] implementation over `tokio-tungstenite`. Every opened
//! transport runs its socket on a spawned task: inbound text frames and
//! lifecycle changes are reported through the [`EventSink`], outbound
//! frames are queued on an unbounded channel.
//!
//! Exactly one `Close` is reported per transport, including when the
//! connection fails to open.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{Connector, EventSink, Transport, TransportError};

/// Opens WebSocket transports. Must be used from within a tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl WsConnector {
    /// Create a new connector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Connector for WsConnector {
    type Transport = WsTransport;

    fn open(&mut self, url: &str, events: EventSink) -> WsTransport {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        tokio::spawn(run_socket(
            url.to_string(),
            events,
            outbound_rx,
            cancel.clone(),
        ));

        WsTransport {
            outbound: outbound_tx,
            cancel,
        }
    }
}

/// Handle to a socket task.
///
/// Dropping the handle closes the socket.
#[derive(Debug)]
pub struct WsTransport {
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl Transport for WsTransport {
    fn send(&mut self, text: String) -> Result<(), TransportError> {
        if self.cancel.is_cancelled() {
            return Err(TransportError::Closed);
        }
        self.outbound
            .send(text)
            .map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        self.cancel.cancel();
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_socket(
    url: String,
    events: EventSink,
    mut outbound: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) {
    let connection = events.connection();

    let connected = tokio::select! {
        () = cancel.cancelled() => {
            events.close();
            return;
        }
        result = tokio_tungstenite::connect_async(url.as_str()) => result,
    };

    let (mut write, mut read) = match connected {
        Ok((ws_stream, _response)) => ws_stream.split(),
        Err(e) => {
            tracing::warn!(connection, url = %url, error = %e, "WebSocket connection failed");
            events.close();
            return;
        }
    };

    tracing::debug!(connection, "WebSocket open");
    events.open();

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                if let Err(e) = write.send(Message::Close(None)).await {
                    tracing::debug!(connection, error = %e, "Close frame not delivered");
                }
                break;
            }
            frame = outbound.recv() => {
                let Some(text) = frame else {
                    break;
                };
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    tracing::warn!(connection, error = %e, "WebSocket send failed");
                    break;
                }
            }
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => events.message(text.as_str()),
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = write.send(Message::Pong(data)).await {
                            tracing::warn!(connection, error = %e, "WebSocket pong failed");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(connection, frame = ?frame, "Server sent close frame");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(connection, error = %e, "WebSocket error");
                        break;
                    }
                    None => {
                        tracing::info!(connection, "WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    events.close();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::TransportEventKind;

    #[tokio::test]
    async fn failed_connection_reports_single_close() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut connector = WsConnector::new();

        let _transport = connector.open("ws://127.0.0.1:1/v2/stream/iex", EventSink::new(3, tx));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.connection, 3);
        assert_eq!(event.kind, TransportEventKind::Close);
    }

    #[tokio::test]
    async fn closed_transport_rejects_frames() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut transport = WsConnector::new().open("ws://127.0.0.1:1", EventSink::new(1, tx));

        transport.close();
        assert!(matches!(
            transport.send("[]".to_string()),
            Err(TransportError::Closed)
        ));
    }
}
