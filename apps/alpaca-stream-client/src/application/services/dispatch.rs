//! Event Dispatch Hub
//!
//! Typed observer registration and fan-out for every event category the
//! stream client produces. Observers run synchronously on the client task,
//! in registration order, and must return quickly: there is no buffering
//! between the connection and the observers.

use std::fmt;
use std::time::Duration;

use crate::domain::connection::{ConnectionState, StreamError};
use crate::domain::streaming::{Bar, Quote, Trade};

type Observer<T> = Box<dyn FnMut(&T) + Send>;

/// Ordered list of observers for one event category.
struct Observers<T> {
    handlers: Vec<Observer<T>>,
}

impl<T> Observers<T> {
    const fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    fn push(&mut self, handler: impl FnMut(&T) + Send + 'static) {
        self.handlers.push(Box::new(handler));
    }

    fn emit(&mut self, value: &T) {
        for handler in &mut self.handlers {
            handler(value);
        }
    }

    fn len(&self) -> usize {
        self.handlers.len()
    }
}

/// Typed observer registry.
pub struct EventHub {
    connect: Observers<()>,
    disconnect: Observers<()>,
    error: Observers<StreamError>,
    state_change: Observers<ConnectionState>,
    reconnect_scheduled: Observers<Duration>,
    trades: Observers<Trade>,
    quotes: Observers<Quote>,
    bars: Observers<Bar>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("connect", &self.connect.len())
            .field("disconnect", &self.disconnect.len())
            .field("error", &self.error.len())
            .field("state_change", &self.state_change.len())
            .field("reconnect_scheduled", &self.reconnect_scheduled.len())
            .field("trades", &self.trades.len())
            .field("quotes", &self.quotes.len())
            .field("bars", &self.bars.len())
            .finish()
    }
}

impl EventHub {
    /// Create a hub with no observers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connect: Observers::new(),
            disconnect: Observers::new(),
            error: Observers::new(),
            state_change: Observers::new(),
            reconnect_scheduled: Observers::new(),
            trades: Observers::new(),
            quotes: Observers::new(),
            bars: Observers::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Called after every successful authentication.
    pub fn on_connect(&mut self, mut handler: impl FnMut() + Send + 'static) {
        self.connect.push(move |()| handler());
    }

    /// Called whenever the connection becomes `Disconnected` from a live
    /// state. A connection attempt whose transport closes before opening
    /// counts as one.
    pub fn on_disconnect(&mut self, mut handler: impl FnMut() + Send + 'static) {
        self.disconnect.push(move |()| handler());
    }

    /// Called for every error surfaced by the client.
    pub fn on_error(&mut self, handler: impl FnMut(&StreamError) + Send + 'static) {
        self.error.push(handler);
    }

    /// Called on every state transition with the new state.
    pub fn on_state_change(&mut self, mut handler: impl FnMut(ConnectionState) + Send + 'static) {
        self.state_change.push(move |state| handler(*state));
    }

    /// Called with the delay whenever a reconnect is scheduled.
    pub fn on_reconnect_scheduled(&mut self, mut handler: impl FnMut(Duration) + Send + 'static) {
        self.reconnect_scheduled.push(move |delay| handler(*delay));
    }

    /// Called for each decoded trade.
    pub fn on_trade(&mut self, handler: impl FnMut(&Trade) + Send + 'static) {
        self.trades.push(handler);
    }

    /// Called for each decoded quote.
    pub fn on_quote(&mut self, handler: impl FnMut(&Quote) + Send + 'static) {
        self.quotes.push(handler);
    }

    /// Called for each decoded bar.
    pub fn on_bar(&mut self, handler: impl FnMut(&Bar) + Send + 'static) {
        self.bars.push(handler);
    }

    // -------------------------------------------------------------------------
    // Emission
    // -------------------------------------------------------------------------

    pub(crate) fn emit_connect(&mut self) {
        self.connect.emit(&());
    }

    pub(crate) fn emit_disconnect(&mut self) {
        self.disconnect.emit(&());
    }

    pub(crate) fn emit_error(&mut self, error: &StreamError) {
        self.error.emit(error);
    }

    pub(crate) fn emit_state_change(&mut self, state: ConnectionState) {
        self.state_change.emit(&state);
    }

    pub(crate) fn emit_reconnect_scheduled(&mut self, delay: Duration) {
        self.reconnect_scheduled.emit(&delay);
    }

    pub(crate) fn emit_trade(&mut self, trade: &Trade) {
        self.trades.emit(trade);
    }

    pub(crate) fn emit_quote(&mut self, quote: &Quote) {
        self.quotes.emit(quote);
    }

    pub(crate) fn emit_bar(&mut self, bar: &Bar) {
        self.bars.emit(bar);
    }
}
