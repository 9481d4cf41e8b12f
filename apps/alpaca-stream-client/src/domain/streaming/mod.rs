//! Market Data Streaming Types
//!
//! Core domain types for market data: trades, quotes, and bars.
//! These types are codec-agnostic and represent the canonical
//! internal representation handed to observers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single executed trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Ticker symbol.
    pub symbol: String,
    /// Trade ID (unique per exchange per day).
    pub trade_id: i64,
    /// Exchange code where the trade executed.
    pub exchange: String,
    /// Execution price.
    pub price: Decimal,
    /// Size in shares.
    pub size: i32,
    /// Execution timestamp.
    pub timestamp: DateTime<Utc>,
    /// Trade condition codes.
    pub conditions: Vec<String>,
    /// Tape identifier.
    pub tape: String,
}

/// Top-of-book quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Ticker symbol.
    pub symbol: String,
    /// Bid exchange code.
    pub bid_exchange: String,
    /// Bid price.
    pub bid_price: Decimal,
    /// Bid size in round lots.
    pub bid_size: i32,
    /// Ask exchange code.
    pub ask_exchange: String,
    /// Ask price.
    pub ask_price: Decimal,
    /// Ask size in round lots.
    pub ask_size: i32,
    /// Quote timestamp.
    pub timestamp: DateTime<Utc>,
    /// Quote condition codes.
    pub conditions: Vec<String>,
    /// Tape identifier.
    pub tape: String,
}

impl Quote {
    /// Ask minus bid.
    #[must_use]
    pub fn spread(&self) -> Decimal {
        self.ask_price - self.bid_price
    }
}

/// Minute bar (OHLCV).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Ticker symbol.
    pub symbol: String,
    /// Open price.
    pub open: Decimal,
    /// High price.
    pub high: Decimal,
    /// Low price.
    pub low: Decimal,
    /// Close price.
    pub close: Decimal,
    /// Volume in shares.
    pub volume: i64,
    /// Number of trades in the bar.
    pub trade_count: i32,
    /// Volume-weighted average price, when provided.
    pub vwap: Option<Decimal>,
    /// Start of the bar period.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_spread() {
        let quote = Quote {
            symbol: "AAPL".to_string(),
            bid_exchange: "Q".to_string(),
            bid_price: Decimal::new(15000, 2),
            bid_size: 1,
            ask_exchange: "P".to_string(),
            ask_price: Decimal::new(15005, 2),
            ask_size: 2,
            timestamp: Utc::now(),
            conditions: vec![],
            tape: "C".to_string(),
        };
        assert_eq!(quote.spread(), Decimal::new(5, 2));
    }
}
