//! Shared fakes for driving a `StreamClient` without a network.

#![allow(dead_code)]

use std::sync::Arc;

use alpaca_stream_client::{
    ClientConfig, Connector, EventSink, ReconnectConfig, Transport, TransportError,
};
use parking_lot::Mutex;
use tokio::time::Instant;

/// Everything the fake transports have seen.
#[derive(Debug, Default)]
pub struct Wire {
    /// Event sinks handed to `open`, one per connection.
    pub sinks: Vec<EventSink>,
    /// When each connection was opened.
    pub opened_at: Vec<Instant>,
    /// Outbound frames across all connections.
    pub sent: Vec<String>,
    /// Number of `close` calls.
    pub closed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FakeConnector {
    pub wire: Arc<Mutex<Wire>>,
}

pub struct FakeTransport {
    wire: Arc<Mutex<Wire>>,
}

impl Connector for FakeConnector {
    type Transport = FakeTransport;

    fn open(&mut self, _url: &str, events: EventSink) -> FakeTransport {
        let mut wire = self.wire.lock();
        wire.sinks.push(events);
        wire.opened_at.push(Instant::now());
        FakeTransport {
            wire: Arc::clone(&self.wire),
        }
    }
}

impl Transport for FakeTransport {
    fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.wire.lock().sent.push(text);
        Ok(())
    }

    fn close(&mut self) {
        self.wire.lock().closed += 1;
    }
}

impl FakeConnector {
    pub fn sink(&self, index: usize) -> EventSink {
        self.wire.lock().sinks[index].clone()
    }

    pub fn opens(&self) -> usize {
        self.wire.lock().sinks.len()
    }

    pub fn sent(&self) -> Vec<serde_json::Value> {
        self.wire
            .lock()
            .sent
            .iter()
            .map(|s| serde_json::from_str(s).unwrap())
            .collect()
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::from_credentials("key", "secret").unwrap()
}

pub fn config_with(reconnect: ReconnectConfig) -> ClientConfig {
    config().with_reconnect(reconnect)
}

/// Let other tasks run until `condition` holds, without advancing time.
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..1_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
