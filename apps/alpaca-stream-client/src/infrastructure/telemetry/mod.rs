//! Logging Setup
//!
//! Installs a `tracing-subscriber` fmt layer filtered by `RUST_LOG`, with
//! this crate at `info` (or `debug` when verbose).
//!
//! # Usage
//!
//! ```ignore
//! use alpaca_stream_client::infrastructure::telemetry;
//!
//! telemetry::init(config.verbose());
//! tracing::info!("Starting");
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Crate directive at normal verbosity.
const DEFAULT_DIRECTIVE: &str = "alpaca_stream_client=info";

/// Crate directive when verbose logging is requested.
const VERBOSE_DIRECTIVE: &str = "alpaca_stream_client=debug";

/// Build the filter: `RUST_LOG` first, then the crate directive.
#[must_use]
#[allow(clippy::expect_used)]
pub fn env_filter(verbose: bool) -> EnvFilter {
    let directive = if verbose {
        VERBOSE_DIRECTIVE
    } else {
        DEFAULT_DIRECTIVE
    };

    EnvFilter::from_default_env()
        .add_directive(
            directive
                .parse()
                .expect("static crate directive is valid"),
        )
        .add_directive(
            "tungstenite=warn"
                .parse()
                .expect("static directive 'tungstenite=warn' is valid"),
        )
}

/// Initialize the global subscriber.
///
/// Does nothing if a subscriber is already installed.
pub fn init(verbose: bool) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(fmt_layer)
        .try_init();
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_includes_crate_directive() {
        assert!(env_filter(false).to_string().contains(DEFAULT_DIRECTIVE));
        assert!(env_filter(true).to_string().contains(VERBOSE_DIRECTIVE));
    }

    #[test]
    fn init_twice_is_harmless() {
        init(false);
        init(true);
    }
}
