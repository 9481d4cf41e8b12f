//! Stream Session
//!
//! The connection state machine, subscription manager and event routing
//! for one Alpaca data stream. A `Session` performs no I/O of its own: it
//! opens transports through a [`Connector`], reacts to the
//! [`TransportEvent`]s those transports report and asks its driver to arm
//! a reconnect timer by returning a delay from
//! [`Session::take_reconnect_request`].
//!
//! All inputs are processed sequentially by a single owner, so none of
//! the state below is shared or locked. Handles read a copy of the state
//! through [`StatusSnapshot`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;

use super::codec::{AlpacaMessage, JsonCodec};
use super::decoder::AlpacaRecordDecoder;
use super::messages::{ErrorMessage, SubscriptionMessage, SubscriptionRequest, SuccessKind};
use super::reconnect::ReconnectPolicy;
use crate::application::ports::{
    Connector, EventSink, RecordDecoder, Transport, TransportEvent, TransportEventKind,
};
use crate::application::services::EventHub;
use crate::domain::connection::{ConnectionState, StreamError};
use crate::domain::subscription::{SubscriptionSet, SubscriptionType, Symbol};
use crate::infrastructure::config::ClientConfig;
use crate::infrastructure::metrics::{self, RecordKind};

/// Read-only view of a session, mirrored for handles on other tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Current connection state.
    pub state: ConnectionState,
    /// Tracked subscriptions.
    pub subscriptions: SubscriptionSet,
}

/// Connection state machine for one stream.
pub struct Session<C: Connector> {
    config: ClientConfig,
    url: String,
    connector: C,
    events: mpsc::UnboundedSender<TransportEvent>,
    transport: Option<C::Transport>,
    connection_id: u64,
    state: ConnectionState,
    authenticated: bool,
    subscriptions: SubscriptionSet,
    policy: ReconnectPolicy,
    reconnect_disabled: bool,
    reconnect_pending: bool,
    scheduled_reconnect: Option<Duration>,
    hub: EventHub,
    decoder: Box<dyn RecordDecoder>,
    codec: JsonCodec,
    status: Arc<RwLock<StatusSnapshot>>,
}

impl<C: Connector> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("url", &self.url)
            .field("connection_id", &self.connection_id)
            .field("state", &self.state)
            .field("authenticated", &self.authenticated)
            .field("subscriptions", &self.subscriptions)
            .field("reconnect_pending", &self.reconnect_pending)
            .field("hub", &self.hub)
            .finish_non_exhaustive()
    }
}

impl<C: Connector> Session<C> {
    /// Create a session.
    ///
    /// Transports opened by this session report their events on `events`;
    /// the owner feeds them back through
    /// [`handle_transport_event`](Self::handle_transport_event).
    #[must_use]
    pub fn new(
        config: ClientConfig,
        connector: C,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Self {
        let url = config.stream_url();
        let policy = ReconnectPolicy::new(config.reconnect().clone());

        Self {
            config,
            url,
            connector,
            events,
            transport: None,
            connection_id: 0,
            state: ConnectionState::default(),
            authenticated: false,
            subscriptions: SubscriptionSet::new(),
            policy,
            reconnect_disabled: false,
            reconnect_pending: false,
            scheduled_reconnect: None,
            hub: EventHub::new(),
            decoder: Box::new(AlpacaRecordDecoder::new()),
            codec: JsonCodec::new(),
            status: Arc::new(RwLock::new(StatusSnapshot::default())),
        }
    }

    /// Replace the record decoder.
    pub fn set_decoder(&mut self, decoder: Box<dyn RecordDecoder>) {
        self.decoder = decoder;
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Current connection state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Tracked subscriptions.
    #[must_use]
    pub const fn subscriptions(&self) -> &SubscriptionSet {
        &self.subscriptions
    }

    /// Streaming URL this session connects to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Observer registry.
    pub const fn hub_mut(&mut self) -> &mut EventHub {
        &mut self.hub
    }

    /// Shared status mirror.
    #[must_use]
    pub fn status(&self) -> Arc<RwLock<StatusSnapshot>> {
        Arc::clone(&self.status)
    }

    /// Whether a reconnect is armed and waiting for its timer.
    #[must_use]
    pub const fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    /// Whether there is nothing left for the session to do: no transport
    /// and no reconnect pending.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.transport.is_none() && !self.reconnect_pending
    }

    /// Take the delay of a newly scheduled reconnect, if any.
    ///
    /// The owner arms a timer for the returned delay and calls
    /// [`fire_reconnect`](Self::fire_reconnect) when it expires.
    pub const fn take_reconnect_request(&mut self) -> Option<Duration> {
        self.scheduled_reconnect.take()
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Open the stream.
    ///
    /// Re-enables reconnection and discards any pending reconnect. Ignored
    /// while a transport is already open.
    pub fn connect(&mut self) {
        if self.transport.is_some() {
            tracing::debug!(state = %self.state, "Connect ignored, transport already open");
            return;
        }

        self.reconnect_disabled = false;
        self.cancel_reconnect();
        self.open_transport();
    }

    /// Close the stream and disable reconnection until the next
    /// [`connect`](Self::connect).
    pub fn disconnect(&mut self) {
        tracing::info!(url = %self.url, "Disconnect requested");

        self.reconnect_disabled = true;
        self.cancel_reconnect();
        self.authenticated = false;

        let transport = self.transport.take();

        if self.state != ConnectionState::Disconnected {
            self.transition(ConnectionState::Disconnected);
        }

        if let Some(mut transport) = transport {
            transport.close();
        }
    }

    /// Fire a reconnect whose timer has expired.
    ///
    /// Does nothing if the reconnect was cancelled in the meantime.
    pub fn fire_reconnect(&mut self) {
        if !self.reconnect_pending || self.reconnect_disabled {
            tracing::debug!("Reconnect timer fired after cancellation, ignoring");
            return;
        }

        self.reconnect_pending = false;

        if self.transport.is_none() {
            self.open_transport();
        }
    }

    /// Process one event reported by a transport.
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        if self.transport.is_none() || event.connection != self.connection_id {
            tracing::trace!(
                connection = event.connection,
                current = self.connection_id,
                "Dropping event from stale connection"
            );
            return;
        }

        match event.kind {
            TransportEventKind::Open => self.authenticate(),
            TransportEventKind::Message(text) => self.handle_frame(&text),
            TransportEventKind::Close => self.handle_close(),
        }
    }

    fn open_transport(&mut self) {
        self.connection_id += 1;
        self.transition(ConnectionState::Connecting);

        tracing::info!(url = %self.url, connection = self.connection_id, "Connecting to stream");

        let sink = EventSink::new(self.connection_id, self.events.clone());
        self.transport = Some(self.connector.open(&self.url, sink));
    }

    fn authenticate(&mut self) {
        self.transition(ConnectionState::Authenticating);

        let request = self.config.credentials().to_auth_request();
        self.send(&request);
    }

    fn handle_close(&mut self) {
        tracing::info!(connection = self.connection_id, "Stream connection closed");

        self.transport = None;
        self.authenticated = false;
        self.transition(ConnectionState::Disconnected);

        if self.config.reconnect().enabled && !self.reconnect_disabled {
            self.reconnect();
        }
    }

    fn reconnect(&mut self) {
        let delay = self.policy.next_delay();
        metrics::record_reconnect();

        tracing::info!(
            delay_ms = delay.as_millis(),
            attempt = self.policy.attempt_count(),
            "Scheduling reconnect"
        );

        self.transition(ConnectionState::WaitingToReconnect);
        self.hub.emit_reconnect_scheduled(delay);

        self.reconnect_pending = true;
        self.scheduled_reconnect = Some(delay);
    }

    const fn cancel_reconnect(&mut self) {
        self.reconnect_pending = false;
        self.scheduled_reconnect = None;
    }

    /// Move to `next`, notify observers and fire the lifecycle side effects
    /// tied to that state.
    fn transition(&mut self, next: ConnectionState) {
        tracing::debug!(from = %self.state, to = %next, "State transition");

        let was_live = self.state.is_live();
        self.state = next;
        self.status.write().state = next;
        metrics::set_connection_state(next);
        self.hub.emit_state_change(next);

        match next {
            ConnectionState::Authenticated => {
                self.hub.emit_connect();
                self.subscribe_all();
            }
            ConnectionState::Disconnected if was_live => self.hub.emit_disconnect(),
            _ => {}
        }
    }

    // -------------------------------------------------------------------------
    // Inbound
    // -------------------------------------------------------------------------

    fn handle_frame(&mut self, text: &str) {
        metrics::record_frame_received();

        if self.config.verbose() {
            tracing::info!(frame = %text, "Received frame");
        } else {
            tracing::trace!(frame = %text, "Received frame");
        }

        match self.codec.decode(text) {
            Ok(messages) => {
                for message in messages {
                    self.handle_message(message);
                }
            }
            Err(e) => self.report(StreamError::MalformedFrame(e.to_string())),
        }
    }

    fn handle_message(&mut self, message: AlpacaMessage) {
        match message {
            AlpacaMessage::Success(success) => match success.msg {
                SuccessKind::Authenticated => self.on_authenticated(),
                SuccessKind::Connected => self.transition(ConnectionState::Connected),
                SuccessKind::Other => tracing::debug!("Ignoring unrecognized success message"),
            },
            AlpacaMessage::Subscription(confirmed) => self.on_subscription(confirmed),
            AlpacaMessage::Error(error) => self.on_server_error(&error),
            AlpacaMessage::Trade(fragment) => match self.decoder.decode_trade(&fragment) {
                Ok(trade) => {
                    metrics::record_dispatched(RecordKind::Trade);
                    self.hub.emit_trade(&trade);
                }
                Err(e) => self.report_decode("t", e.0),
            },
            AlpacaMessage::Quote(fragment) => match self.decoder.decode_quote(&fragment) {
                Ok(quote) => {
                    metrics::record_dispatched(RecordKind::Quote);
                    self.hub.emit_quote(&quote);
                }
                Err(e) => self.report_decode("q", e.0),
            },
            AlpacaMessage::Bar(fragment) => match self.decoder.decode_bar(&fragment) {
                Ok(bar) => {
                    metrics::record_dispatched(RecordKind::Bar);
                    self.hub.emit_bar(&bar);
                }
                Err(e) => self.report_decode("b", e.0),
            },
            AlpacaMessage::Malformed {
                message_type,
                reason,
            } => self.report(StreamError::Decode {
                message_type,
                reason,
            }),
            AlpacaMessage::Unknown(message_type) => {
                self.report(StreamError::UnexpectedMessage { message_type });
            }
            AlpacaMessage::Untagged => tracing::trace!("Ignoring untagged fragment"),
        }
    }

    fn on_authenticated(&mut self) {
        tracing::info!(url = %self.url, "Stream authenticated");

        self.authenticated = true;
        self.policy.reset();
        self.transition(ConnectionState::Authenticated);
    }

    fn on_subscription(&mut self, confirmed: SubscriptionMessage) {
        tracing::info!(
            trades = confirmed.trades.len(),
            quotes = confirmed.quotes.len(),
            bars = confirmed.bars.len(),
            "Subscriptions confirmed"
        );
        if self.config.verbose() {
            tracing::info!(
                trades = ?confirmed.trades,
                quotes = ?confirmed.quotes,
                bars = ?confirmed.bars,
                "Subscribed symbols"
            );
        }

        self.subscriptions
            .replace(confirmed.trades, confirmed.quotes, confirmed.bars);
        self.publish_subscriptions();
    }

    fn on_server_error(&mut self, error: &ErrorMessage) {
        if error.is_auth_error() {
            tracing::error!(code = error.code, msg = %error.msg, "Stream authentication error");
        }

        self.report(StreamError::Server {
            code: error.code,
            reason: error.reason().to_string(),
        });
    }

    fn report_decode(&mut self, message_type: &str, reason: String) {
        self.report(StreamError::Decode {
            message_type: message_type.to_string(),
            reason,
        });
    }

    fn report(&mut self, error: StreamError) {
        tracing::warn!(error = %error, "Stream client error");
        metrics::record_error(&error);
        self.hub.emit_error(&error);
    }

    // -------------------------------------------------------------------------
    // Subscriptions
    // -------------------------------------------------------------------------

    /// Track `symbols` for trades and subscribe to them.
    pub fn subscribe_for_trades<I>(&mut self, symbols: I)
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        self.subscribe(SubscriptionType::Trades, symbols);
    }

    /// Track `symbols` for quotes and subscribe to them.
    pub fn subscribe_for_quotes<I>(&mut self, symbols: I)
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        self.subscribe(SubscriptionType::Quotes, symbols);
    }

    /// Track `symbols` for bars and subscribe to them.
    pub fn subscribe_for_bars<I>(&mut self, symbols: I)
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        self.subscribe(SubscriptionType::Bars, symbols);
    }

    /// Unsubscribe `symbols` from trades.
    pub fn unsubscribe_from_trades<I>(&mut self, symbols: I)
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        self.unsubscribe(SubscriptionType::Trades, symbols);
    }

    /// Unsubscribe `symbols` from quotes.
    pub fn unsubscribe_from_quotes<I>(&mut self, symbols: I)
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        self.unsubscribe(SubscriptionType::Quotes, symbols);
    }

    /// Unsubscribe `symbols` from bars.
    pub fn unsubscribe_from_bars<I>(&mut self, symbols: I)
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        self.unsubscribe(SubscriptionType::Bars, symbols);
    }

    /// Track `symbols` for one channel and send a subscribe naming only
    /// that channel.
    ///
    /// Before authentication the symbols are only tracked; they go out with
    /// the consolidated subscribe sent once the stream authenticates.
    pub fn subscribe<I>(&mut self, kind: SubscriptionType, symbols: I)
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        let symbols: Vec<Symbol> = symbols.into_iter().map(Into::into).collect();
        if symbols.is_empty() {
            return;
        }

        let added = self.subscriptions.extend(kind, symbols.iter().cloned());
        self.publish_subscriptions();

        tracing::debug!(channel = kind.as_str(), requested = symbols.len(), added, "Subscribe");

        if self.authenticated {
            self.send(&SubscriptionRequest::subscribe().with_channel(kind, symbols));
        }
    }

    /// Send an unsubscribe for one channel.
    ///
    /// The tracked set is left untouched; the server's confirmation
    /// replaces it. Without an authenticated stream nothing is sent and a
    /// [`StreamError::NotAuthenticated`] is reported, since the symbols are
    /// restored again on the next authentication.
    pub fn unsubscribe<I>(&mut self, kind: SubscriptionType, symbols: I)
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        let symbols: Vec<Symbol> = symbols.into_iter().map(Into::into).collect();
        if symbols.is_empty() {
            return;
        }

        if self.authenticated {
            tracing::debug!(channel = kind.as_str(), count = symbols.len(), "Unsubscribe");
            self.send(&SubscriptionRequest::unsubscribe().with_channel(kind, symbols));
        } else {
            self.report(StreamError::NotAuthenticated {
                action: "unsubscribe",
                channel: kind.as_str(),
            });
        }
    }

    /// Send one subscribe covering every tracked symbol.
    ///
    /// Sends nothing when no symbols are tracked or the stream is not
    /// authenticated.
    pub fn subscribe_all(&mut self) {
        if !self.authenticated {
            return;
        }

        match SubscriptionRequest::restore(&self.subscriptions) {
            Some(request) => {
                tracing::info!(symbols = self.subscriptions.len(), "Restoring subscriptions");
                self.send(&request);
            }
            None => tracing::debug!("No subscriptions to restore"),
        }
    }

    fn publish_subscriptions(&self) {
        metrics::set_subscriptions(self.subscriptions.len());
        self.status.write().subscriptions = self.subscriptions.clone();
    }

    // -------------------------------------------------------------------------
    // Outbound
    // -------------------------------------------------------------------------

    fn send<T: Serialize>(&mut self, message: &T) {
        let text = match self.codec.encode(message) {
            Ok(text) => text,
            Err(e) => {
                self.report(StreamError::Transport(e.to_string()));
                return;
            }
        };

        let Some(transport) = self.transport.as_mut() else {
            self.report(StreamError::Transport("no open transport".to_string()));
            return;
        };

        if let Err(e) = transport.send(text) {
            self.report(StreamError::Transport(e.to_string()));
        }
    }
}
