//! Reconnection Policy
//!
//! Computes the delay before each reconnection attempt. With backoff
//! enabled the delay grows additively by a fixed increment up to a
//! ceiling; without backoff it stays at the configured initial delay.
//! Reconnection itself is unbounded: only the delay is capped.

use std::time::Duration;

/// Floor applied to the constant delay when backoff is disabled.
pub const MIN_CONSTANT_DELAY: Duration = Duration::from_secs(1);

/// Configuration for reconnection behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Reconnect automatically when the server closes the connection.
    pub enabled: bool,
    /// Grow the delay between attempts.
    pub backoff: bool,
    /// Delay before the first attempt.
    pub initial_delay: Duration,
    /// Ceiling for the delay when backoff is enabled.
    pub max_delay: Duration,
    /// Amount added to the delay on every attempt when backoff is enabled.
    pub backoff_increment: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backoff: true,
            initial_delay: Duration::ZERO,
            max_delay: Duration::from_secs(30),
            backoff_increment: Duration::from_millis(500),
        }
    }
}

impl ReconnectConfig {
    /// Configuration that never reconnects.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Reconnection policy implementing capped additive backoff.
///
/// # Example
///
/// ```rust
/// use alpaca_stream_client::infrastructure::alpaca::reconnect::{ReconnectConfig, ReconnectPolicy};
/// use std::time::Duration;
///
/// let mut policy = ReconnectPolicy::new(ReconnectConfig::default());
///
/// assert_eq!(policy.next_delay(), Duration::from_millis(500));
/// assert_eq!(policy.next_delay(), Duration::from_millis(1000));
///
/// // Successful authentication
/// policy.reset();
/// assert_eq!(policy.next_delay(), Duration::from_millis(500));
/// ```
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    current_delay: Duration,
    attempt_count: u32,
}

impl ReconnectPolicy {
    /// Create a new reconnection policy.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        let initial_delay = config.initial_delay;
        Self {
            config,
            current_delay: initial_delay,
            attempt_count: 0,
        }
    }

    /// Advance to the delay for the next attempt and return it.
    pub fn next_delay(&mut self) -> Duration {
        self.attempt_count = self.attempt_count.saturating_add(1);

        self.current_delay = if self.config.backoff {
            self.current_delay
                .saturating_add(self.config.backoff_increment)
                .min(self.config.max_delay)
        } else if self.config.initial_delay.is_zero() {
            MIN_CONSTANT_DELAY
        } else {
            self.config.initial_delay
        };

        self.current_delay
    }

    /// Reset the policy after a successful connection.
    pub const fn reset(&mut self) {
        self.current_delay = self.config.initial_delay;
        self.attempt_count = 0;
    }

    /// Delay used for the most recent attempt (or the initial delay).
    #[must_use]
    pub const fn current_delay(&self) -> Duration {
        self.current_delay
    }

    /// Get the current attempt count.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }
}
