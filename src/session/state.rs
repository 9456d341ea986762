//! Session lifecycle states.
//!
//! ```text
//! Disconnected ──► Connecting ──► AwaitingReady ──► Live ◄──► AwaitingPong
//!      ▲                               │              │            │
//!      └───────────── backoff ◄────────┴──────────────┴────────────┘
//!
//! any state ──close()──► Terminated
//! ```

use std::fmt;

/// State of a session engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No transport; waiting for `connect()` or the reconnect backoff.
    #[default]
    Disconnected,
    /// Opening the transport.
    Connecting,
    /// `Identify` sent, waiting for `Ready`.
    AwaitingReady,
    /// Handshake complete, events flowing.
    Live,
    /// `Ping` sent, waiting for `Pong`.
    AwaitingPong,
    /// Closed for good.
    Terminated,
}

impl SessionState {
    /// Returns `true` once the handshake has completed on the current connection.
    #[inline]
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Live | Self::AwaitingPong)
    }

    /// Returns `true` for [`SessionState::Terminated`].
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Lower-case name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::AwaitingReady => "awaiting_ready",
            Self::Live => "live",
            Self::AwaitingPong => "awaiting_pong",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(SessionState::Live.is_live());
        assert!(SessionState::AwaitingPong.is_live());
        assert!(!SessionState::AwaitingReady.is_live());
        assert!(SessionState::Terminated.is_terminal());
        assert!(!SessionState::Disconnected.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(SessionState::AwaitingPong.to_string(), "awaiting_pong");
        assert_eq!(SessionState::default(), SessionState::Disconnected);
    }
}
