//! Alpaca WebSocket Authentication
//!
//! The stream expects a single auth action right after the socket opens:
//!
//! ```text
//! client → {"action":"auth","key":"...","secret":"..."}
//! server ← [{"T":"success","msg":"authenticated"}]
//!        | [{"T":"error","code":402,"msg":"auth failed"}]
//! ```
//!
//! Credentials are checked when they are built, so a client holding a
//! [`Credentials`] value always has something to send.
//!
//! # References
//!
//! - [Stock Streaming Auth](https://docs.alpaca.markets/docs/streaming-market-data)

use std::fmt;

use thiserror::Error;

use super::messages::AuthRequest;

/// Errors raised while building credentials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// API key was empty.
    #[error("missing api key")]
    MissingApiKey,

    /// API secret was empty.
    #[error("missing secret key")]
    MissingSecretKey,
}

/// Key id and secret used to authenticate the stream.
///
/// Formatting with `{:?}` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    key_id: String,
    secret_key: String,
}

impl Credentials {
    /// Validate and store a key pair.
    ///
    /// # Errors
    ///
    /// [`AuthError::MissingApiKey`] or [`AuthError::MissingSecretKey`] when
    /// the corresponding value is empty. The key is checked first.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Result<Self, AuthError> {
        let key_id = non_empty(key.into(), AuthError::MissingApiKey)?;
        let secret_key = non_empty(secret.into(), AuthError::MissingSecretKey)?;
        Ok(Self { key_id, secret_key })
    }

    /// API key id.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key_id
    }

    /// API secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret_key
    }

    /// The `auth` action carrying this key pair.
    #[must_use]
    pub fn to_auth_request(&self) -> AuthRequest {
        AuthRequest::new(self.key_id.clone(), self.secret_key.clone())
    }
}

fn non_empty(value: String, missing: AuthError) -> Result<String, AuthError> {
    if value.is_empty() {
        Err(missing)
    } else {
        Ok(value)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn keeps_both_values() {
        let creds = Credentials::new("PKTEST", "s3cr3t").unwrap();
        assert_eq!(creds.key(), "PKTEST");
        assert_eq!(creds.secret(), "s3cr3t");
    }

    #[test_case("", "secret", AuthError::MissingApiKey ; "empty key")]
    #[test_case("key", "", AuthError::MissingSecretKey ; "empty secret")]
    #[test_case("", "", AuthError::MissingApiKey ; "key reported first")]
    fn rejects_missing_values(key: &str, secret: &str, expected: AuthError) {
        assert_eq!(Credentials::new(key, secret).unwrap_err(), expected);
    }

    #[test]
    fn debug_output_hides_secret() {
        let creds = Credentials::new("PKTEST", "super_secret").unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("PKTEST"));
        assert!(!debug.contains("super_secret"));
    }

    #[test]
    fn auth_request_wire_shape() {
        let creds = Credentials::new("test_key", "test_secret").unwrap();
        let value = serde_json::to_value(creds.to_auth_request()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"action": "auth", "key": "test_key", "secret": "test_secret"})
        );
    }
}
