//! Configuration Module
//!
//! Client configuration and environment loading.

mod settings;

pub use settings::{ClientConfig, ConfigError, DEFAULT_STREAM_URL, DataFeed};
