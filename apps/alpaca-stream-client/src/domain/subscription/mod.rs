//! Subscription Tracking Types
//!
//! Tracks which symbols the client wants on each channel so that the full
//! set can be restored after a reconnect.
//!
//! # Design
//!
//! The set has two write paths:
//! - Local accumulation from subscribe calls (append only, deduplicated)
//! - Wholesale replacement from the server's `subscription` confirmation
//!
//! The server confirmation is the source of truth and always wins over
//! whatever was accumulated locally.

/// A symbol string (stock ticker).
pub type Symbol = String;

// =============================================================================
// Subscription Type
// =============================================================================

/// Market data channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionType {
    /// Trade data.
    Trades,
    /// Quote data.
    Quotes,
    /// Minute bar (OHLCV) data.
    Bars,
}

impl SubscriptionType {
    /// Get all subscription types.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Trades, Self::Quotes, Self::Bars]
    }

    /// Channel name as used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trades => "trades",
            Self::Quotes => "quotes",
            Self::Bars => "bars",
        }
    }
}

// =============================================================================
// Subscription Set
// =============================================================================

/// Symbols tracked per channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSet {
    trades: Vec<Symbol>,
    quotes: Vec<Symbol>,
    bars: Vec<Symbol>,
}

impl SubscriptionSet {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            trades: Vec::new(),
            quotes: Vec::new(),
            bars: Vec::new(),
        }
    }

    /// Symbols tracked for trades.
    #[must_use]
    pub fn trades(&self) -> &[Symbol] {
        &self.trades
    }

    /// Symbols tracked for quotes.
    #[must_use]
    pub fn quotes(&self) -> &[Symbol] {
        &self.quotes
    }

    /// Symbols tracked for bars.
    #[must_use]
    pub fn bars(&self) -> &[Symbol] {
        &self.bars
    }

    /// Symbols tracked for a channel.
    #[must_use]
    pub fn symbols(&self, kind: SubscriptionType) -> &[Symbol] {
        match kind {
            SubscriptionType::Trades => &self.trades,
            SubscriptionType::Quotes => &self.quotes,
            SubscriptionType::Bars => &self.bars,
        }
    }

    /// Check if a symbol is tracked on a channel.
    #[must_use]
    pub fn contains(&self, kind: SubscriptionType, symbol: &str) -> bool {
        self.symbols(kind).iter().any(|s| s == symbol)
    }

    /// Check if there are no tracked symbols on any channel.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.trades.is_empty() && self.quotes.is_empty() && self.bars.is_empty()
    }

    /// Total number of tracked (channel, symbol) pairs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.trades.len() + self.quotes.len() + self.bars.len()
    }

    /// Append symbols to a channel, skipping ones already tracked.
    ///
    /// Returns the number of symbols that were newly added.
    pub fn extend<I, S>(&mut self, kind: SubscriptionType, symbols: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        let tracked = self.symbols_mut(kind);
        let before = tracked.len();

        for symbol in symbols {
            let symbol = symbol.into();
            if !tracked.contains(&symbol) {
                tracked.push(symbol);
            }
        }

        tracked.len() - before
    }

    /// Replace every channel with the server-confirmed lists.
    pub fn replace(&mut self, trades: Vec<Symbol>, quotes: Vec<Symbol>, bars: Vec<Symbol>) {
        *self = Self::new();
        self.extend(SubscriptionType::Trades, trades);
        self.extend(SubscriptionType::Quotes, quotes);
        self.extend(SubscriptionType::Bars, bars);
    }

    fn symbols_mut(&mut self, kind: SubscriptionType) -> &mut Vec<Symbol> {
        match kind {
            SubscriptionType::Trades => &mut self.trades,
            SubscriptionType::Quotes => &mut self.quotes,
            SubscriptionType::Bars => &mut self.bars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_set_is_empty() {
        let set = SubscriptionSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn extend_tracks_per_channel() {
        let mut set = SubscriptionSet::new();
        set.extend(SubscriptionType::Trades, ["AAPL"]);
        set.extend(SubscriptionType::Quotes, ["FB", "MSFT"]);

        assert_eq!(set.trades(), ["AAPL"]);
        assert_eq!(set.quotes(), ["FB", "MSFT"]);
        assert!(set.bars().is_empty());
        assert!(set.contains(SubscriptionType::Quotes, "MSFT"));
        assert!(!set.contains(SubscriptionType::Trades, "MSFT"));
    }

    #[test]
    fn extend_skips_duplicates() {
        let mut set = SubscriptionSet::new();
        assert_eq!(set.extend(SubscriptionType::Bars, ["SPY", "SPY"]), 1);
        assert_eq!(set.extend(SubscriptionType::Bars, ["SPY", "QQQ"]), 1);
        assert_eq!(set.bars(), ["SPY", "QQQ"]);
    }

    #[test]
    fn replace_discards_prior_symbols() {
        let mut set = SubscriptionSet::new();
        set.extend(SubscriptionType::Trades, ["AAPL", "TSLA"]);
        set.extend(SubscriptionType::Quotes, ["FB"]);

        set.replace(vec!["X".to_string()], vec![], vec![]);

        assert_eq!(set.trades(), ["X"]);
        assert!(set.quotes().is_empty());
        assert!(set.bars().is_empty());
    }

    #[test]
    fn channel_names() {
        let names: Vec<_> = SubscriptionType::all().iter().map(|t| t.as_str()).collect();
        assert_eq!(names, ["trades", "quotes", "bars"]);
    }
}
