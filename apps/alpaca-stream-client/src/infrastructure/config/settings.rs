//! Client Configuration Settings
//!
//! Configuration for the stream client, built in code or loaded from
//! environment variables.

use std::time::Duration;

use crate::infrastructure::alpaca::auth::{AuthError, Credentials};
use crate::infrastructure::alpaca::reconnect::ReconnectConfig;

/// Default market data endpoint.
pub const DEFAULT_STREAM_URL: &str = "https://stream.data.alpaca.markets";

/// Protocol version segment of the streaming path.
const STREAM_PATH: &str = "v2/stream";

/// Market data feed for Alpaca streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataFeed {
    /// IEX (Investors Exchange) - Free tier with limited data.
    #[default]
    Iex,
    /// SIP (Securities Information Processor) - Full market data.
    Sip,
}

impl DataFeed {
    /// Parse feed type from string.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "sip" => Self::Sip,
            _ => Self::Iex,
        }
    }

    /// Get the feed name for WebSocket URLs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Iex => "iex",
            Self::Sip => "sip",
        }
    }
}

/// Stream client configuration.
///
/// Immutable once handed to the client. Credentials are validated when
/// they are built, so a `ClientConfig` always carries a usable key/secret
/// pair.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    credentials: Credentials,
    url: String,
    feed: DataFeed,
    reconnect: ReconnectConfig,
    verbose: bool,
}

impl ClientConfig {
    /// Create a configuration with default endpoint, feed and reconnect
    /// behavior.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            url: DEFAULT_STREAM_URL.to_string(),
            feed: DataFeed::default(),
            reconnect: ReconnectConfig::default(),
            verbose: false,
        }
    }

    /// Build a configuration from a key/secret pair.
    ///
    /// # Errors
    ///
    /// Returns an error if either value is empty.
    pub fn from_credentials(
        key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, AuthError> {
        Credentials::new(key, secret).map(Self::new)
    }

    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `ALPACA_KEY` or `ALPACA_SECRET` is missing or
    /// empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = Credentials::new(
            required(&lookup, "ALPACA_KEY")?,
            required(&lookup, "ALPACA_SECRET")?,
        )?;

        let defaults = ReconnectConfig::default();
        let reconnect = ReconnectConfig {
            enabled: parse_bool(lookup("ALPACA_STREAM_RECONNECT"), defaults.enabled),
            backoff: parse_bool(lookup("ALPACA_STREAM_BACKOFF"), defaults.backoff),
            initial_delay: parse_millis(
                lookup("ALPACA_STREAM_RECONNECT_DELAY_MS"),
                defaults.initial_delay,
            ),
            max_delay: parse_millis(
                lookup("ALPACA_STREAM_MAX_RECONNECT_DELAY_MS"),
                defaults.max_delay,
            ),
            backoff_increment: parse_millis(
                lookup("ALPACA_STREAM_BACKOFF_INCREMENT_MS"),
                defaults.backoff_increment,
            ),
        };

        let feed = lookup("ALPACA_FEED")
            .map(|s| DataFeed::from_str_case_insensitive(&s))
            .unwrap_or_default();

        let url = lookup("ALPACA_STREAM_URL")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_STREAM_URL.to_string());

        Ok(Self {
            credentials,
            url,
            feed,
            reconnect,
            verbose: parse_bool(lookup("ALPACA_STREAM_VERBOSE"), false),
        })
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    /// Use a different base endpoint.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Use a different feed.
    #[must_use]
    pub const fn with_feed(mut self, feed: DataFeed) -> Self {
        self.feed = feed;
        self
    }

    /// Replace the reconnect settings.
    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Toggle raw frame logging.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// API credentials.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Base endpoint as configured.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Selected feed.
    #[must_use]
    pub const fn feed(&self) -> DataFeed {
        self.feed
    }

    /// Reconnect settings.
    #[must_use]
    pub const fn reconnect(&self) -> &ReconnectConfig {
        &self.reconnect
    }

    /// Whether raw frames are logged.
    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// WebSocket URL for the configured endpoint and feed.
    ///
    /// `https://host` becomes `wss://host/v2/stream/{feed}`; `http` maps to
    /// `ws`. URLs already using a WebSocket scheme are kept as they are.
    #[must_use]
    pub fn stream_url(&self) -> String {
        let base = self.url.trim_end_matches('/');

        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };

        format!("{base}/{STREAM_PATH}/{}", self.feed.as_str())
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Credentials were rejected.
    #[error(transparent)]
    Credentials(#[from] AuthError),
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))?;
    if value.is_empty() {
        return Err(ConfigError::EmptyValue(key.to_string()));
    }
    Ok(value)
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    match value.as_deref().map(str::to_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

fn parse_millis(value: Option<String>, default: Duration) -> Duration {
    value
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use test_case::test_case;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn config() -> ClientConfig {
        ClientConfig::from_credentials("key", "secret").unwrap()
    }

    #[test]
    fn data_feed_parsing() {
        assert_eq!(DataFeed::from_str_case_insensitive("sip"), DataFeed::Sip);
        assert_eq!(DataFeed::from_str_case_insensitive("SIP"), DataFeed::Sip);
        assert_eq!(DataFeed::from_str_case_insensitive("iex"), DataFeed::Iex);
        assert_eq!(
            DataFeed::from_str_case_insensitive("unknown"),
            DataFeed::Iex
        );
    }

    #[test]
    fn defaults() {
        let config = config();
        assert_eq!(config.url(), DEFAULT_STREAM_URL);
        assert_eq!(config.feed(), DataFeed::Iex);
        assert_eq!(config.reconnect(), &ReconnectConfig::default());
        assert!(!config.verbose());
    }

    #[test_case("https://stream.data.alpaca.markets", DataFeed::Iex, "wss://stream.data.alpaca.markets/v2/stream/iex" ; "https")]
    #[test_case("http://localhost:8080/", DataFeed::Sip, "ws://localhost:8080/v2/stream/sip" ; "http with trailing slash")]
    #[test_case("wss://example.test", DataFeed::Iex, "wss://example.test/v2/stream/iex" ; "already websocket")]
    fn stream_url(base: &str, feed: DataFeed, expected: &str) {
        let config = config().with_url(base).with_feed(feed);
        assert_eq!(config.stream_url(), expected);
    }

    #[test]
    fn from_lookup_reads_all_settings() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("ALPACA_KEY", "k"),
            ("ALPACA_SECRET", "s"),
            ("ALPACA_FEED", "SIP"),
            ("ALPACA_STREAM_URL", "http://localhost:9000"),
            ("ALPACA_STREAM_RECONNECT", "false"),
            ("ALPACA_STREAM_BACKOFF", "no"),
            ("ALPACA_STREAM_RECONNECT_DELAY_MS", "250"),
            ("ALPACA_STREAM_MAX_RECONNECT_DELAY_MS", "5000"),
            ("ALPACA_STREAM_BACKOFF_INCREMENT_MS", "100"),
            ("ALPACA_STREAM_VERBOSE", "1"),
        ]))
        .unwrap();

        assert_eq!(config.credentials().key(), "k");
        assert_eq!(config.feed(), DataFeed::Sip);
        assert_eq!(config.url(), "http://localhost:9000");
        assert!(config.verbose());

        let reconnect = config.reconnect();
        assert!(!reconnect.enabled);
        assert!(!reconnect.backoff);
        assert_eq!(reconnect.initial_delay, Duration::from_millis(250));
        assert_eq!(reconnect.max_delay, Duration::from_secs(5));
        assert_eq!(reconnect.backoff_increment, Duration::from_millis(100));
    }

    #[test]
    fn from_lookup_falls_back_on_unparseable_values() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("ALPACA_KEY", "k"),
            ("ALPACA_SECRET", "s"),
            ("ALPACA_STREAM_RECONNECT", "maybe"),
            ("ALPACA_STREAM_RECONNECT_DELAY_MS", "soon"),
        ]))
        .unwrap();

        assert!(config.reconnect().enabled);
        assert_eq!(config.reconnect().initial_delay, Duration::ZERO);
    }

    #[test]
    fn from_lookup_requires_key() {
        let err = ClientConfig::from_lookup(lookup(&[("ALPACA_SECRET", "s")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "ALPACA_KEY"));
    }

    #[test]
    fn from_lookup_rejects_empty_secret() {
        let err = ClientConfig::from_lookup(lookup(&[("ALPACA_KEY", "k"), ("ALPACA_SECRET", "")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyValue(ref k) if k == "ALPACA_SECRET"));
    }

    #[test]
    fn from_credentials_rejects_empty_key() {
        assert_eq!(
            ClientConfig::from_credentials("", "secret").unwrap_err(),
            AuthError::MissingApiKey
        );
    }
}
