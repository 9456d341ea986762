//! Session timing and authentication options.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use chatlink::SessionOptions;
//!
//! let options = SessionOptions::new()
//!     .with_token("secret")
//!     .with_heartbeat_interval(Duration::from_secs(15))
//!     .with_reconnect_backoff(Duration::from_secs(2));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default wait for `Ready` after `Identify`.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default idle time between pings.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Default wait for `Pong` after `Ping`.
pub const DEFAULT_PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Default delay before reconnecting.
pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

/// Default number of events waiting for listeners.
pub const DEFAULT_DISPATCH_CAPACITY: usize = 1024;

// ============================================================================
// SessionOptions
// ============================================================================

/// Options for one session engine.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Access token sent with `Identify`.
    pub token: Option<String>,

    /// Wait for `Ready` after `Identify`.
    pub ready_timeout: Duration,

    /// Idle time between pings.
    pub heartbeat_interval: Duration,

    /// Wait for `Pong` after `Ping`.
    pub pong_timeout: Duration,

    /// Delay before each reconnection attempt.
    pub reconnect_backoff: Duration,

    /// Events that may wait for listeners; newer events are dropped when full.
    pub dispatch_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOptions")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("ready_timeout", &self.ready_timeout)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("pong_timeout", &self.pong_timeout)
            .field("reconnect_backoff", &self.reconnect_backoff)
            .field("dispatch_capacity", &self.dispatch_capacity)
            .finish()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl SessionOptions {
    /// Creates options with the default timings and no token.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            token: None,
            ready_timeout: DEFAULT_READY_TIMEOUT,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            pong_timeout: DEFAULT_PONG_TIMEOUT,
            reconnect_backoff: DEFAULT_RECONNECT_BACKOFF,
            dispatch_capacity: DEFAULT_DISPATCH_CAPACITY,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl SessionOptions {
    /// Sets the access token.
    #[inline]
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the handshake timeout.
    #[inline]
    #[must_use]
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Sets the ping interval.
    #[inline]
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the pong timeout.
    #[inline]
    #[must_use]
    pub fn with_pong_timeout(mut self, timeout: Duration) -> Self {
        self.pong_timeout = timeout;
        self
    }

    /// Sets the reconnect backoff.
    #[inline]
    #[must_use]
    pub fn with_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    /// Sets the dispatch queue capacity.
    #[inline]
    #[must_use]
    pub fn with_dispatch_capacity(mut self, capacity: usize) -> Self {
        self.dispatch_capacity = capacity;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SessionOptions {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns an error message if any duration or the dispatch capacity
    /// is zero.
    pub fn validate(&self) -> Result<(), String> {
        let durations = [
            ("ready_timeout", self.ready_timeout),
            ("heartbeat_interval", self.heartbeat_interval),
            ("pong_timeout", self.pong_timeout),
            ("reconnect_backoff", self.reconnect_backoff),
        ];

        if let Some((name, _)) = durations.iter().find(|(_, d)| d.is_zero()) {
            return Err(format!("{name} must be greater than zero"));
        }
        if self.dispatch_capacity == 0 {
            return Err("dispatch_capacity must be greater than zero".to_owned());
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
