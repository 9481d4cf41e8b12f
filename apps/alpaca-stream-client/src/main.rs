//! Alpaca Stream Client Binary
//!
//! Connects to the market data stream and logs every trade, quote and bar.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin alpaca-stream-client
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `ALPACA_KEY`: Alpaca API key
//! - `ALPACA_SECRET`: Alpaca API secret
//!
//! ## Optional
//! - `ALPACA_FEED`: Market data feed - "iex" | "sip" (default: iex)
//! - `ALPACA_STREAM_URL`: Base endpoint (default: <https://stream.data.alpaca.markets>)
//! - `ALPACA_STREAM_RECONNECT`: Reconnect on close (default: true)
//! - `ALPACA_STREAM_BACKOFF`: Grow the reconnect delay (default: true)
//! - `ALPACA_STREAM_RECONNECT_DELAY_MS`: Initial reconnect delay (default: 0)
//! - `ALPACA_STREAM_MAX_RECONNECT_DELAY_MS`: Reconnect delay ceiling (default: 30000)
//! - `ALPACA_STREAM_BACKOFF_INCREMENT_MS`: Backoff step (default: 500)
//! - `ALPACA_STREAM_VERBOSE`: Log raw frames (default: false)
//! - `ALPACA_STREAM_TRADES` / `_QUOTES` / `_BARS`: Comma-separated symbols
//! - `ALPACA_STREAM_METRICS_PORT`: Prometheus exporter port (default: disabled)
//! - `RUST_LOG`: Log level (default: info)

use std::net::SocketAddr;

use alpaca_stream_client::infrastructure::telemetry;
use alpaca_stream_client::{ClientConfig, StreamClient, init_metrics};
use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    load_dotenv();

    let config = ClientConfig::from_env().context("invalid stream configuration")?;
    telemetry::init(config.verbose());

    tracing::info!(
        feed = config.feed().as_str(),
        url = %config.stream_url(),
        reconnect = config.reconnect().enabled,
        backoff = config.reconnect().backoff,
        "Starting Alpaca Stream Client"
    );

    if let Some(port) = env_port("ALPACA_STREAM_METRICS_PORT") {
        init_metrics(SocketAddr::from(([0, 0, 0, 0], port)))
            .context("failed to start metrics exporter")?;
    }

    let mut client = StreamClient::new(config);
    client
        .on_connect(|| tracing::info!("Stream connected"))
        .on_disconnect(|| tracing::info!("Stream disconnected"))
        .on_state_change(|state| tracing::debug!(state = %state, "State changed"))
        .on_reconnect_scheduled(|delay| {
            tracing::info!(delay_ms = delay.as_millis(), "Reconnect scheduled");
        })
        .on_error(|error| tracing::warn!(error = %error, "Stream error"))
        .on_trade(|trade| {
            tracing::info!(
                symbol = %trade.symbol,
                price = %trade.price,
                size = trade.size,
                exchange = %trade.exchange,
                "Trade"
            );
        })
        .on_quote(|quote| {
            tracing::info!(
                symbol = %quote.symbol,
                bid = %quote.bid_price,
                ask = %quote.ask_price,
                spread = %quote.spread(),
                "Quote"
            );
        })
        .on_bar(|bar| {
            tracing::info!(
                symbol = %bar.symbol,
                open = %bar.open,
                close = %bar.close,
                volume = bar.volume,
                "Bar"
            );
        });

    let handle = client.handle();
    handle.subscribe_for_trades(env_symbols("ALPACA_STREAM_TRADES"))?;
    handle.subscribe_for_quotes(env_symbols("ALPACA_STREAM_QUOTES"))?;
    handle.subscribe_for_bars(env_symbols("ALPACA_STREAM_BARS"))?;
    handle.connect()?;

    let shutdown_token = CancellationToken::new();
    let client_task = tokio::spawn(client.run(shutdown_token.clone()));

    await_shutdown(shutdown_token).await;
    client_task.await.context("stream client task failed")?;

    tracing::info!("Alpaca Stream Client stopped");
    Ok(())
}

/// Parse a comma-separated symbol list.
fn env_symbols(key: &str) -> Vec<String> {
    std::env::var(key)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_uppercase)
                .collect()
        })
        .unwrap_or_default()
}

fn env_port(key: &str) -> Option<u16> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|port| *port != 0)
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
