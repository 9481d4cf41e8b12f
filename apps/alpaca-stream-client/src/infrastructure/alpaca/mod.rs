//! Alpaca Stream Adapters
//!
//! Client for Alpaca's v2 stock market data stream:
//!
//! - **Session**: connection state machine and subscription manager
//! - **Client**: async driver owning the session, plus cloneable handles
//! - **Transport**: WebSocket adapter (JSON text frames)
//! - **Decoder**: trades, quotes and bars from raw fragments

pub mod auth;
pub mod client;
pub mod codec;
pub mod decoder;
pub mod messages;
pub mod reconnect;
pub mod session;
pub mod transport;

pub use auth::{AuthError, Credentials};
pub use client::{ClientStopped, Command, StreamClient, StreamHandle};
pub use codec::{AlpacaMessage, CodecError, JsonCodec};
pub use decoder::AlpacaRecordDecoder;
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
pub use session::{Session, StatusSnapshot};
pub use transport::{WsConnector, WsTransport};
