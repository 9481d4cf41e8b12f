//! Stream Client
//!
//! Async driver for a [`Session`]. [`StreamClient::run`] owns the session
//! and serialises every input on one task: transport events, commands
//! from [`StreamHandle`]s and the reconnect timer.
//!
//! # Usage
//!
//! ```ignore
//! let mut client = StreamClient::new(ClientConfig::from_env()?);
//! client.on_trade(|trade| tracing::info!(symbol = %trade.symbol, "trade"));
//!
//! let handle = client.handle();
//! handle.subscribe_for_trades(["AAPL"])?;
//! handle.connect()?;
//!
//! let cancel = CancellationToken::new();
//! tokio::spawn(client.run(cancel.clone()));
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::session::{Session, StatusSnapshot};
use super::transport::WsConnector;
use crate::application::ports::{Connector, RecordDecoder, TransportEvent};
use crate::domain::connection::{ConnectionState, StreamError};
use crate::domain::streaming::{Bar, Quote, Trade};
use crate::domain::subscription::{SubscriptionSet, SubscriptionType, Symbol};
use crate::infrastructure::config::ClientConfig;

// =============================================================================
// Commands
// =============================================================================

/// Request sent from a handle to the client task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the stream.
    Connect,
    /// Close the stream and stop reconnecting.
    Disconnect,
    /// Track and subscribe symbols on one channel.
    Subscribe {
        /// Channel.
        kind: SubscriptionType,
        /// Symbols.
        symbols: Vec<Symbol>,
    },
    /// Unsubscribe symbols on one channel.
    Unsubscribe {
        /// Channel.
        kind: SubscriptionType,
        /// Symbols.
        symbols: Vec<Symbol>,
    },
}

/// The client task has stopped and no longer accepts commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("stream client stopped")]
pub struct ClientStopped;

// =============================================================================
// Client
// =============================================================================

/// Market data stream client.
pub struct StreamClient<C: Connector = WsConnector> {
    session: Session<C>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    commands_tx: mpsc::UnboundedSender<Command>,
    commands_rx: mpsc::UnboundedReceiver<Command>,
}

impl StreamClient<WsConnector> {
    /// Create a client using the WebSocket transport.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self::with_connector(config, WsConnector::new())
    }
}

impl<C: Connector> StreamClient<C> {
    /// Create a client using a custom transport.
    #[must_use]
    pub fn with_connector(config: ClientConfig, connector: C) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        Self {
            session: Session::new(config, connector, events_tx),
            events,
            commands_tx,
            commands_rx,
        }
    }

    /// Use a custom record decoder.
    #[must_use]
    pub fn with_decoder(mut self, decoder: impl RecordDecoder + 'static) -> Self {
        self.session.set_decoder(Box::new(decoder));
        self
    }

    /// Create a handle for controlling the client once it runs.
    ///
    /// Commands sent before [`run`](Self::run) is called are queued.
    #[must_use]
    pub fn handle(&self) -> StreamHandle {
        StreamHandle {
            commands: self.commands_tx.clone(),
            status: self.session.status(),
        }
    }

    /// Streaming URL the client connects to.
    #[must_use]
    pub fn url(&self) -> &str {
        self.session.url()
    }

    // -------------------------------------------------------------------------
    // Observers
    // -------------------------------------------------------------------------

    /// Register an observer for successful authentication.
    pub fn on_connect(&mut self, handler: impl FnMut() + Send + 'static) -> &mut Self {
        self.session.hub_mut().on_connect(handler);
        self
    }

    /// Register an observer for disconnects.
    pub fn on_disconnect(&mut self, handler: impl FnMut() + Send + 'static) -> &mut Self {
        self.session.hub_mut().on_disconnect(handler);
        self
    }

    /// Register an observer for client errors.
    pub fn on_error(&mut self, handler: impl FnMut(&StreamError) + Send + 'static) -> &mut Self {
        self.session.hub_mut().on_error(handler);
        self
    }

    /// Register an observer for state changes.
    pub fn on_state_change(
        &mut self,
        handler: impl FnMut(ConnectionState) + Send + 'static,
    ) -> &mut Self {
        self.session.hub_mut().on_state_change(handler);
        self
    }

    /// Register an observer for scheduled reconnects.
    pub fn on_reconnect_scheduled(
        &mut self,
        handler: impl FnMut(Duration) + Send + 'static,
    ) -> &mut Self {
        self.session.hub_mut().on_reconnect_scheduled(handler);
        self
    }

    /// Register an observer for trades.
    pub fn on_trade(&mut self, handler: impl FnMut(&Trade) + Send + 'static) -> &mut Self {
        self.session.hub_mut().on_trade(handler);
        self
    }

    /// Register an observer for quotes.
    pub fn on_quote(&mut self, handler: impl FnMut(&Quote) + Send + 'static) -> &mut Self {
        self.session.hub_mut().on_quote(handler);
        self
    }

    /// Register an observer for bars.
    pub fn on_bar(&mut self, handler: impl FnMut(&Bar) + Send + 'static) -> &mut Self {
        self.session.hub_mut().on_bar(handler);
        self
    }

    // -------------------------------------------------------------------------
    // Run loop
    // -------------------------------------------------------------------------

    /// Run the client until cancelled.
    ///
    /// Also returns once every [`StreamHandle`] has been dropped and the
    /// session has nothing left to do (no open transport, no pending
    /// reconnect). On cancellation the stream is disconnected first.
    pub async fn run(self, cancel: CancellationToken) {
        let Self {
            mut session,
            mut events,
            commands_tx,
            mut commands_rx,
        } = self;
        drop(commands_tx);

        let reconnect_timer = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(reconnect_timer);
        let mut timer_armed = false;
        let mut commands_open = true;

        loop {
            if let Some(delay) = session.take_reconnect_request() {
                reconnect_timer.as_mut().reset(Instant::now() + delay);
                timer_armed = true;
            }
            if !session.reconnect_pending() {
                timer_armed = false;
            }
            if !commands_open && session.is_idle() {
                tracing::info!("All stream handles dropped, stopping client");
                break;
            }

            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!("Stream client cancelled");
                    session.disconnect();
                    break;
                }
                Some(event) = events.recv() => {
                    session.handle_transport_event(event);
                }
                command = commands_rx.recv(), if commands_open => {
                    match command {
                        Some(command) => apply(&mut session, command),
                        None => commands_open = false,
                    }
                }
                () = &mut reconnect_timer, if timer_armed => {
                    timer_armed = false;
                    session.fire_reconnect();
                }
            }
        }
    }
}

fn apply<C: Connector>(session: &mut Session<C>, command: Command) {
    match command {
        Command::Connect => session.connect(),
        Command::Disconnect => session.disconnect(),
        Command::Subscribe { kind, symbols } => session.subscribe(kind, symbols),
        Command::Unsubscribe { kind, symbols } => session.unsubscribe(kind, symbols),
    }
}

impl<C: Connector> std::fmt::Debug for StreamClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Cloneable handle for controlling a running [`StreamClient`].
#[derive(Debug, Clone)]
pub struct StreamHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: Arc<RwLock<StatusSnapshot>>,
}

impl StreamHandle {
    /// Queue a command for the client task.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has stopped.
    pub fn send(&self, command: Command) -> Result<(), ClientStopped> {
        self.commands.send(command).map_err(|_| ClientStopped)
    }

    /// Open the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has stopped.
    pub fn connect(&self) -> Result<(), ClientStopped> {
        self.send(Command::Connect)
    }

    /// Close the stream and stop reconnecting.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has stopped.
    pub fn disconnect(&self) -> Result<(), ClientStopped> {
        self.send(Command::Disconnect)
    }

    /// Subscribe to trades for `symbols`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has stopped.
    pub fn subscribe_for_trades<I>(&self, symbols: I) -> Result<(), ClientStopped>
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        self.subscription(SubscriptionType::Trades, symbols, true)
    }

    /// Subscribe to quotes for `symbols`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has stopped.
    pub fn subscribe_for_quotes<I>(&self, symbols: I) -> Result<(), ClientStopped>
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        self.subscription(SubscriptionType::Quotes, symbols, true)
    }

    /// Subscribe to bars for `symbols`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has stopped.
    pub fn subscribe_for_bars<I>(&self, symbols: I) -> Result<(), ClientStopped>
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        self.subscription(SubscriptionType::Bars, symbols, true)
    }

    /// Unsubscribe from trades for `symbols`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has stopped.
    pub fn unsubscribe_from_trades<I>(&self, symbols: I) -> Result<(), ClientStopped>
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        self.subscription(SubscriptionType::Trades, symbols, false)
    }

    /// Unsubscribe from quotes for `symbols`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has stopped.
    pub fn unsubscribe_from_quotes<I>(&self, symbols: I) -> Result<(), ClientStopped>
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        self.subscription(SubscriptionType::Quotes, symbols, false)
    }

    /// Unsubscribe from bars for `symbols`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has stopped.
    pub fn unsubscribe_from_bars<I>(&self, symbols: I) -> Result<(), ClientStopped>
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        self.subscription(SubscriptionType::Bars, symbols, false)
    }

    fn subscription<I>(
        &self,
        kind: SubscriptionType,
        symbols: I,
        subscribe: bool,
    ) -> Result<(), ClientStopped>
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        let symbols = symbols.into_iter().map(Into::into).collect();
        self.send(if subscribe {
            Command::Subscribe { kind, symbols }
        } else {
            Command::Unsubscribe { kind, symbols }
        })
    }

    /// Last known connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.status.read().state
    }

    /// Last known tracked subscriptions.
    #[must_use]
    pub fn subscriptions(&self) -> SubscriptionSet {
        self.status.read().subscriptions.clone()
    }

    /// Whether the client task has stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.commands.is_closed()
    }
}
