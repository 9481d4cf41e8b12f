//! Stream Codec Module
//!
//! JSON encoding and decoding for Alpaca's v2 market data stream.
//!
//! Alpaca sends frames as JSON arrays where each element is one message
//! fragment carrying a `T` discriminator:
//!
//! ```json
//! [{"T":"success","msg":"authenticated"},{"T":"t","S":"AAPL",...}]
//! ```
//!
//! Each fragment is classified independently. Control fragments are fully
//! decoded here; data fragments are kept as raw JSON and handed to the
//! record decoder so a single bad record cannot spoil the rest of a batch.

use serde_json::Value;

use super::messages::{ErrorMessage, SubscriptionMessage, SuccessMessage};

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON encoding/decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid message format.
    #[error("invalid message format: {0}")]
    InvalidFormat(String),
}

/// One classified fragment of an inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum AlpacaMessage {
    /// Connection/authentication success
    Success(SuccessMessage),

    /// Error message
    Error(ErrorMessage),

    /// Subscription confirmation
    Subscription(SubscriptionMessage),

    /// Raw trade fragment (`"T":"t"`)
    Trade(Value),

    /// Raw quote fragment (`"T":"q"`)
    Quote(Value),

    /// Raw bar fragment (`"T":"b"`)
    Bar(Value),

    /// Fragment with a discriminator this client does not handle
    Unknown(String),

    /// Control fragment whose body did not match its schema
    Malformed {
        /// Discriminator of the fragment
        message_type: String,
        /// Parse failure description
        reason: String,
    },

    /// Fragment without a discriminator
    Untagged,
}

/// JSON codec for the stock data stream.
#[derive(Debug, Default, Clone)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a JSON text frame into its fragments, in order.
    ///
    /// A frame holding a single JSON object is treated as a batch of one.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is not JSON, or is JSON but neither an
    /// array nor an object.
    pub fn decode(&self, text: &str) -> Result<Vec<AlpacaMessage>, CodecError> {
        let value: Value = serde_json::from_str(text.trim())?;

        match value {
            Value::Array(fragments) => Ok(fragments.into_iter().map(classify).collect()),
            object @ Value::Object(_) => Ok(vec![classify(object)]),
            other => Err(CodecError::InvalidFormat(format!(
                "expected JSON array or object, got: {}",
                truncate(&other.to_string(), 50)
            ))),
        }
    }

    /// Encode a value to JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn encode<T: serde::Serialize>(&self, value: &T) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }
}

fn classify(value: Value) -> AlpacaMessage {
    let msg_type = match value.get("T") {
        None => return AlpacaMessage::Untagged,
        Some(Value::String(t)) => t.clone(),
        Some(other) => return AlpacaMessage::Unknown(other.to_string()),
    };

    match msg_type.as_str() {
        "success" => control(&msg_type, value, AlpacaMessage::Success),
        "error" => control(&msg_type, value, AlpacaMessage::Error),
        "subscription" => control(&msg_type, value, AlpacaMessage::Subscription),
        "t" => AlpacaMessage::Trade(value),
        "q" => AlpacaMessage::Quote(value),
        "b" => AlpacaMessage::Bar(value),
        _ => AlpacaMessage::Unknown(msg_type),
    }
}

fn control<T, F>(msg_type: &str, value: Value, wrap: F) -> AlpacaMessage
where
    T: serde::de::DeserializeOwned,
    F: FnOnce(T) -> AlpacaMessage,
{
    match serde_json::from_value(value) {
        Ok(msg) => wrap(msg),
        Err(e) => AlpacaMessage::Malformed {
            message_type: msg_type.to_string(),
            reason: e.to_string(),
        },
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(idx, _)| &text[..idx])
}
