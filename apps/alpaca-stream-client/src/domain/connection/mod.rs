//! Connection Lifecycle Types
//!
//! The stream client is always in exactly one [`ConnectionState`]. States
//! only change through the session's transition helper, which also emits
//! a state-change notification for every change.
//!
//! ```text
//! WaitingToConnect ─► Connecting ─► Authenticating ─► Connected ─► Authenticated
//!                         ▲                                              │
//!                         │                                         (close)
//!                  WaitingToReconnect ◄──────────── Disconnected ◄───────┘
//! ```

use std::fmt;

// =============================================================================
// Connection State
// =============================================================================

/// Lifecycle state of the stream connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Client constructed, `connect` not yet requested.
    #[default]
    WaitingToConnect,
    /// Transport is being opened.
    Connecting,
    /// Transport open, auth request sent.
    Authenticating,
    /// Server accepted the credentials.
    Authenticated,
    /// Server acknowledged the connection (informational).
    Connected,
    /// Transport closed, either by the server or on request.
    Disconnected,
    /// Reconnect timer armed.
    WaitingToReconnect,
}

impl ConnectionState {
    /// Every state, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::WaitingToConnect,
        Self::Connecting,
        Self::Authenticating,
        Self::Authenticated,
        Self::Connected,
        Self::Disconnected,
        Self::WaitingToReconnect,
    ];

    /// Human-readable state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingToConnect => "waiting to connect",
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::WaitingToReconnect => "waiting to reconnect",
        }
    }

    /// Check if a transport may be live in this state.
    ///
    /// `Connecting` counts, so a transport that closes before it opens
    /// still leaves a live state.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(
            self,
            Self::Connecting | Self::Authenticating | Self::Authenticated | Self::Connected
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Stream Errors
// =============================================================================

/// Errors surfaced to error observers while the client is running.
///
/// None of these tear down the connection on their own; the server decides
/// whether to close after a protocol error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Server sent an `error` control message.
    #[error("server error ({code}): {reason}")]
    Server {
        /// Error code from the server.
        code: i32,
        /// Reason resolved from the error code table.
        reason: String,
    },

    /// Data fragment with an unrecognized discriminator.
    #[error("unexpected message: {message_type}")]
    UnexpectedMessage {
        /// The discriminator value that was received.
        message_type: String,
    },

    /// Frame could not be parsed as a message batch.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Recognized fragment whose payload did not decode.
    #[error("failed to decode {message_type} message: {reason}")]
    Decode {
        /// The discriminator value of the fragment.
        message_type: String,
        /// Decoder failure description.
        reason: String,
    },

    /// Outbound frame could not be handed to the transport.
    #[error("transport error: {0}")]
    Transport(String),

    /// Request that needs an authenticated stream was made without one.
    #[error("not authenticated: {action} on {channel} not sent")]
    NotAuthenticated {
        /// Protocol action that was dropped.
        action: &'static str,
        /// Channel the request named.
        channel: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_waiting_to_connect() {
        assert_eq!(ConnectionState::default(), ConnectionState::WaitingToConnect);
    }

    #[test]
    fn state_names_are_unique() {
        let mut names: Vec<_> = ConnectionState::ALL.iter().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ConnectionState::ALL.len());
    }

    #[test]
    fn display_uses_state_name() {
        assert_eq!(
            ConnectionState::WaitingToReconnect.to_string(),
            "waiting to reconnect"
        );
    }

    #[test]
    fn live_states() {
        assert!(ConnectionState::Connecting.is_live());
        assert!(ConnectionState::Authenticated.is_live());
        assert!(!ConnectionState::Disconnected.is_live());
        assert!(!ConnectionState::WaitingToReconnect.is_live());
        assert!(!ConnectionState::WaitingToConnect.is_live());
    }

    #[test]
    fn server_error_display() {
        let err = StreamError::Server {
            code: 402,
            reason: "auth failed".to_string(),
        };
        assert_eq!(err.to_string(), "server error (402): auth failed");
    }
}
