//! Alpaca WebSocket Message Types
//!
//! Wire format types for Alpaca's v2 market data stream. These types map
//! directly to Alpaca's JSON message schemas.
//!
//! # Message Types
//!
//! ## Control Messages
//! - `Success`: `connected` / `authenticated` acknowledgments
//! - `Error`: Error response with code and message
//! - `Subscription`: Subscription confirmation
//!
//! ## Data Messages
//! - `Trade` (`"T":"t"`)
//! - `Quote` (`"T":"q"`)
//! - `Bar` (`"T":"b"`)
//!
//! # References
//!
//! - [Stock Streaming](https://docs.alpaca.markets/docs/real-time-stock-pricing-data)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::streaming::{Bar, Quote, Trade};
use crate::domain::subscription::{SubscriptionSet, SubscriptionType, Symbol};

// =============================================================================
// Control Messages
// =============================================================================

/// Success message indicating connection or authentication succeeded.
///
/// # Wire Format (JSON)
/// ```json
/// {"T": "success", "msg": "connected"}
/// {"T": "success", "msg": "authenticated"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessMessage {
    /// Message type (always "success")
    #[serde(rename = "T")]
    pub msg_type: String,

    /// Success message: "connected" or "authenticated"
    pub msg: SuccessKind,
}

/// Kind of success message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuccessKind {
    /// Initial connection established
    Connected,
    /// Authentication successful
    Authenticated,
    /// Any other success payload
    #[serde(other)]
    Other,
}

/// Error message with code and description.
///
/// # Wire Format (JSON)
/// ```json
/// {"T": "error", "code": 401, "msg": "not authenticated"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Message type (always "error")
    #[serde(rename = "T")]
    pub msg_type: String,

    /// Error code
    pub code: i32,

    /// Error message as sent by the server
    #[serde(default)]
    pub msg: String,
}

/// Reason used for codes missing from the error table.
pub const UNKNOWN_ERROR_REASON: &str = "unknown error";

/// Resolve a server error code to its human-readable reason.
#[must_use]
pub const fn error_reason(code: i32) -> Option<&'static str> {
    match code {
        400 => Some("invalid syntax"),
        401 => Some("not authenticated"),
        402 => Some("auth failed"),
        403 => Some("already authenticated"),
        404 => Some("auth timeout"),
        405 => Some("symbol limit exceeded"),
        406 => Some("connection limit exceeded"),
        407 => Some("slow client"),
        408 => Some("feature not enabled"),
        500 => Some("internal error"),
        _ => None,
    }
}

impl ErrorMessage {
    /// Human-readable reason for this error's code.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        error_reason(self.code).unwrap_or(UNKNOWN_ERROR_REASON)
    }

    /// Check if this is an authentication error.
    #[must_use]
    pub const fn is_auth_error(&self) -> bool {
        matches!(self.code, 401..=404)
    }
}

/// Subscription confirmation message.
///
/// Sent after a subscribe/unsubscribe action with the complete set of
/// active subscriptions.
///
/// # Wire Format (JSON)
/// ```json
/// {
///   "T": "subscription",
///   "trades": ["AAPL"],
///   "quotes": ["AMD", "CLDR"],
///   "bars": ["*"]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionMessage {
    /// Message type (always "subscription")
    #[serde(rename = "T")]
    pub msg_type: String,

    /// Subscribed trade symbols
    #[serde(default)]
    pub trades: Vec<Symbol>,

    /// Subscribed quote symbols
    #[serde(default)]
    pub quotes: Vec<Symbol>,

    /// Subscribed bar symbols
    #[serde(default)]
    pub bars: Vec<Symbol>,
}

// =============================================================================
// Data Messages
// =============================================================================

/// Real-time stock trade.
///
/// # Wire Format (JSON)
/// ```json
/// {
///   "T": "t",
///   "i": 96921,
///   "S": "AAPL",
///   "x": "D",
///   "p": 126.55,
///   "s": 1,
///   "t": "2021-02-22T15:51:44.208Z",
///   "c": ["@", "I"],
///   "z": "C"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockTradeMessage {
    /// Message type (always "t")
    #[serde(rename = "T")]
    pub msg_type: String,

    /// Ticker symbol (e.g., "AAPL")
    #[serde(rename = "S")]
    pub symbol: String,

    /// Trade ID (unique per exchange per day)
    #[serde(rename = "i")]
    pub trade_id: i64,

    /// Exchange code where trade executed
    #[serde(rename = "x")]
    pub exchange: String,

    /// Trade price
    #[serde(rename = "p")]
    pub price: Decimal,

    /// Trade size (shares)
    #[serde(rename = "s")]
    pub size: i32,

    /// Trade timestamp (RFC-3339 with nanosecond precision)
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,

    /// Trade condition codes (e.g., "@" for regular sale)
    #[serde(rename = "c", default)]
    pub conditions: Vec<String>,

    /// Tape: "A" (NYSE), "B" (ARCA/regional), "C" (NASDAQ)
    #[serde(rename = "z", default)]
    pub tape: String,
}

impl From<StockTradeMessage> for Trade {
    fn from(msg: StockTradeMessage) -> Self {
        Self {
            symbol: msg.symbol,
            trade_id: msg.trade_id,
            exchange: msg.exchange,
            price: msg.price,
            size: msg.size,
            timestamp: msg.timestamp,
            conditions: msg.conditions,
            tape: msg.tape,
        }
    }
}

/// Real-time stock quote.
///
/// # Wire Format (JSON)
/// ```json
/// {
///   "T": "q",
///   "S": "AMD",
///   "bx": "U",
///   "bp": 87.66,
///   "bs": 1,
///   "ax": "Q",
///   "ap": 87.68,
///   "as": 4,
///   "t": "2021-02-22T15:51:45.335689322Z",
///   "c": ["R"],
///   "z": "C"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockQuoteMessage {
    /// Message type (always "q")
    #[serde(rename = "T")]
    pub msg_type: String,

    /// Ticker symbol
    #[serde(rename = "S")]
    pub symbol: String,

    /// Bid exchange code
    #[serde(rename = "bx")]
    pub bid_exchange: String,

    /// Bid price
    #[serde(rename = "bp")]
    pub bid_price: Decimal,

    /// Bid size (in round lots)
    #[serde(rename = "bs")]
    pub bid_size: i32,

    /// Ask exchange code
    #[serde(rename = "ax")]
    pub ask_exchange: String,

    /// Ask price
    #[serde(rename = "ap")]
    pub ask_price: Decimal,

    /// Ask size (in round lots)
    #[serde(rename = "as")]
    pub ask_size: i32,

    /// Quote timestamp
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,

    /// Quote condition codes
    #[serde(rename = "c", default)]
    pub conditions: Vec<String>,

    /// Tape
    #[serde(rename = "z", default)]
    pub tape: String,
}

impl From<StockQuoteMessage> for Quote {
    fn from(msg: StockQuoteMessage) -> Self {
        Self {
            symbol: msg.symbol,
            bid_exchange: msg.bid_exchange,
            bid_price: msg.bid_price,
            bid_size: msg.bid_size,
            ask_exchange: msg.ask_exchange,
            ask_price: msg.ask_price,
            ask_size: msg.ask_size,
            timestamp: msg.timestamp,
            conditions: msg.conditions,
            tape: msg.tape,
        }
    }
}

/// Minute bar (OHLCV).
///
/// # Wire Format (JSON)
/// ```json
/// {
///   "T": "b",
///   "S": "SPY",
///   "o": 388.985,
///   "h": 389.13,
///   "l": 388.975,
///   "c": 389.12,
///   "v": 49378,
///   "n": 461,
///   "vw": 389.062639,
///   "t": "2021-02-22T19:15:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockBarMessage {
    /// Message type (always "b")
    #[serde(rename = "T")]
    pub msg_type: String,

    /// Ticker symbol
    #[serde(rename = "S")]
    pub symbol: String,

    /// Open price
    #[serde(rename = "o")]
    pub open: Decimal,

    /// High price
    #[serde(rename = "h")]
    pub high: Decimal,

    /// Low price
    #[serde(rename = "l")]
    pub low: Decimal,

    /// Close price
    #[serde(rename = "c")]
    pub close: Decimal,

    /// Volume (shares)
    #[serde(rename = "v")]
    pub volume: i64,

    /// Number of trades in bar
    #[serde(rename = "n", default)]
    pub trade_count: i32,

    /// Volume-weighted average price
    #[serde(rename = "vw", default)]
    pub vwap: Option<Decimal>,

    /// Bar timestamp (start of bar period)
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
}

impl From<StockBarMessage> for Bar {
    fn from(msg: StockBarMessage) -> Self {
        Self {
            symbol: msg.symbol,
            open: msg.open,
            high: msg.high,
            low: msg.low,
            close: msg.close,
            volume: msg.volume,
            trade_count: msg.trade_count,
            vwap: msg.vwap,
            timestamp: msg.timestamp,
        }
    }
}

// =============================================================================
// Outbound Messages (Client -> Server)
// =============================================================================

/// Authentication request.
///
/// # Wire Format (JSON)
/// ```json
/// {"action": "auth", "key": "...", "secret": "..."}
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest {
    /// Action: "auth"
    pub action: &'static str,

    /// API key
    pub key: String,

    /// API secret
    pub secret: String,
}

impl AuthRequest {
    /// Create a new authentication request.
    #[must_use]
    pub const fn new(key: String, secret: String) -> Self {
        Self {
            action: "auth",
            key,
            secret,
        }
    }
}

/// Subscribe or unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionAction {
    /// Add channels.
    Subscribe,
    /// Remove channels.
    Unsubscribe,
}

/// Subscription request.
///
/// All three channel lists are always present on the wire; channels not
/// affected by a request are sent as empty arrays.
///
/// # Wire Format (JSON)
/// ```json
/// {"action": "subscribe", "trades": ["AAPL"], "quotes": [], "bars": []}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionRequest {
    /// Action: "subscribe" or "unsubscribe"
    pub action: SubscriptionAction,

    /// Trade symbols
    pub trades: Vec<Symbol>,

    /// Quote symbols
    pub quotes: Vec<Symbol>,

    /// Bar symbols
    pub bars: Vec<Symbol>,
}

impl SubscriptionRequest {
    const fn empty(action: SubscriptionAction) -> Self {
        Self {
            action,
            trades: Vec::new(),
            quotes: Vec::new(),
            bars: Vec::new(),
        }
    }

    /// Create a subscribe request.
    #[must_use]
    pub const fn subscribe() -> Self {
        Self::empty(SubscriptionAction::Subscribe)
    }

    /// Create an unsubscribe request.
    #[must_use]
    pub const fn unsubscribe() -> Self {
        Self::empty(SubscriptionAction::Unsubscribe)
    }

    /// Set the symbols for one channel.
    #[must_use]
    pub fn with_channel(mut self, kind: SubscriptionType, symbols: Vec<Symbol>) -> Self {
        match kind {
            SubscriptionType::Trades => self.trades = symbols,
            SubscriptionType::Quotes => self.quotes = symbols,
            SubscriptionType::Bars => self.bars = symbols,
        }
        self
    }

    /// Subscribe request covering every tracked symbol.
    ///
    /// Returns `None` when nothing is tracked.
    #[must_use]
    pub fn restore(set: &SubscriptionSet) -> Option<Self> {
        if set.is_empty() {
            return None;
        }

        Some(Self {
            action: SubscriptionAction::Subscribe,
            trades: set.trades().to_vec(),
            quotes: set.quotes().to_vec(),
            bars: set.bars().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn test_deserialize_success_connected() {
        let json = r#"{"T":"success","msg":"connected"}"#;
        let msg: SuccessMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.msg, SuccessKind::Connected);
    }

    #[test]
    fn test_deserialize_success_authenticated() {
        let json = r#"{"T":"success","msg":"authenticated"}"#;
        let msg: SuccessMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.msg, SuccessKind::Authenticated);
    }

    #[test]
    fn test_deserialize_success_other() {
        let json = r#"{"T":"success","msg":"something new"}"#;
        let msg: SuccessMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.msg, SuccessKind::Other);
    }

    #[test]
    fn test_deserialize_error_without_msg() {
        let json = r#"{"T":"error","code":406}"#;
        let msg: ErrorMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.code, 406);
        assert!(msg.msg.is_empty());
    }

    #[test_case(400, "invalid syntax")]
    #[test_case(401, "not authenticated")]
    #[test_case(402, "auth failed")]
    #[test_case(403, "already authenticated")]
    #[test_case(404, "auth timeout")]
    #[test_case(405, "symbol limit exceeded")]
    #[test_case(406, "connection limit exceeded")]
    #[test_case(407, "slow client")]
    #[test_case(408, "feature not enabled")]
    #[test_case(500, "internal error")]
    fn error_table(code: i32, reason: &str) {
        assert_eq!(error_reason(code), Some(reason));
    }

    #[test]
    fn unknown_error_code_still_has_reason() {
        let msg = ErrorMessage {
            msg_type: "error".to_string(),
            code: 499,
            msg: String::new(),
        };
        assert_eq!(error_reason(499), None);
        assert_eq!(msg.reason(), UNKNOWN_ERROR_REASON);
    }

    #[test]
    fn test_deserialize_subscription_with_missing_channels() {
        let json = r#"{"T":"subscription","trades":["AAPL"]}"#;
        let msg: SubscriptionMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.trades, vec!["AAPL"]);
        assert!(msg.quotes.is_empty());
        assert!(msg.bars.is_empty());
    }

    #[test]
    fn test_trade_into_domain() {
        let json = r#"{
            "T": "t",
            "i": 96921,
            "S": "AAPL",
            "x": "D",
            "p": 126.55,
            "s": 1,
            "t": "2021-02-22T15:51:44.208Z",
            "c": ["@", "I"],
            "z": "C"
        }"#;
        let msg: StockTradeMessage = serde_json::from_str(json).unwrap();
        let trade = Trade::from(msg);
        assert_eq!(trade.symbol, "AAPL");
        assert_eq!(trade.trade_id, 96921);
        assert_eq!(trade.price, Decimal::new(12655, 2));
        assert_eq!(trade.conditions, vec!["@", "I"]);
    }

    #[test]
    fn test_serialize_auth_request() {
        let req = AuthRequest::new("key123".to_string(), "secret456".to_string());
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(
            json,
            r#"{"action":"auth","key":"key123","secret":"secret456"}"#
        );
    }

    #[test]
    fn test_serialize_partial_subscription_keeps_empty_channels() {
        let req = SubscriptionRequest::subscribe()
            .with_channel(SubscriptionType::Trades, vec!["AAPL".to_string()]);
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(
            json,
            r#"{"action":"subscribe","trades":["AAPL"],"quotes":[],"bars":[]}"#
        );
    }

    #[test]
    fn test_serialize_unsubscribe() {
        let req = SubscriptionRequest::unsubscribe()
            .with_channel(SubscriptionType::Bars, vec!["SPY".to_string()]);
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(
            json,
            r#"{"action":"unsubscribe","trades":[],"quotes":[],"bars":["SPY"]}"#
        );
    }

    #[test]
    fn restore_empty_set_is_none() {
        assert!(SubscriptionRequest::restore(&SubscriptionSet::new()).is_none());
    }

    #[test]
    fn restore_covers_every_channel() {
        let mut set = SubscriptionSet::new();
        set.extend(SubscriptionType::Quotes, ["AAPL", "MSFT"]);
        set.extend(SubscriptionType::Trades, ["TSLA"]);

        let request = SubscriptionRequest::restore(&set).unwrap();
        assert_eq!(request.action, SubscriptionAction::Subscribe);
        assert_eq!(request.quotes, vec!["AAPL", "MSFT"]);
        assert_eq!(request.trades, vec!["TSLA"]);
        assert!(request.bars.is_empty());
    }
}
