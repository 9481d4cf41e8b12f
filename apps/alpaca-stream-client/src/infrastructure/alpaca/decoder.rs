//! Record Decoder
//!
//! Default [`RecordDecoder`] for Alpaca's JSON data fragments. Each
//! fragment is deserialized into its wire message and converted into the
//! domain record handed to observers.

use serde::Deserialize;
use serde_json::Value;

use super::messages::{StockBarMessage, StockQuoteMessage, StockTradeMessage};
use crate::application::ports::{DecodeError, RecordDecoder};
use crate::domain::streaming::{Bar, Quote, Trade};

/// Decodes Alpaca v2 stock trades, quotes and bars.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlpacaRecordDecoder;

impl AlpacaRecordDecoder {
    /// Create a new decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn decode<'a, M, R>(fragment: &'a Value) -> Result<R, DecodeError>
where
    M: Deserialize<'a>,
    R: From<M>,
{
    M::deserialize(fragment)
        .map(R::from)
        .map_err(|e| DecodeError(e.to_string()))
}

impl RecordDecoder for AlpacaRecordDecoder {
    fn decode_trade(&self, fragment: &Value) -> Result<Trade, DecodeError> {
        decode::<StockTradeMessage, _>(fragment)
    }

    fn decode_quote(&self, fragment: &Value) -> Result<Quote, DecodeError> {
        decode::<StockQuoteMessage, _>(fragment)
    }

    fn decode_bar(&self, fragment: &Value) -> Result<Bar, DecodeError> {
        decode::<StockBarMessage, _>(fragment)
    }
}
