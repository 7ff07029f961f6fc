//! Session-level error type.
//!
//! Most abnormal conditions in this protocol are handled locally and never
//! reach the caller: receive timeouts trigger retransmission, malformed
//! datagrams are treated as dropped, out-of-order segments are answered
//! with a re-acknowledgment.  What remains terminal is an I/O failure from
//! the operating system and the one bounded-retry exhaustion the protocol
//! defines — giving up on the close handshake.

use crate::config::ConfigError;
use crate::socket::SocketError;

/// Terminal failures a session can surface.
#[derive(Debug)]
pub enum SessionError {
    /// A configuration field was out of range.
    Config(ConfigError),
    /// Transport-level failure from the socket layer.
    Socket(SocketError),
    /// The close negotiation exhausted its retry budget; the connection was
    /// force-closed.
    TeardownGiveUp,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Socket(e) => write!(f, "socket failure: {e}"),
            Self::TeardownGiveUp => {
                write!(f, "close handshake abandoned after exhausting retries")
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<SocketError> for SessionError {
    fn from(e: SocketError) -> Self {
        Self::Socket(e)
    }
}
