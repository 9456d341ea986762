//! Error types for the chat protocol client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use chatlink::{markup, Result};
//!
//! fn first_quote(content: &str) -> Result<Option<String>> {
//!     let elements = markup::decode(content)?;
//!     Ok(markup::select(&elements, "quote").and_then(|q| q.attr_str("id")).map(str::to_owned))
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Session | [`Error::HandshakeTimeout`], [`Error::HeartbeatTimeout`], [`Error::Transport`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::FrameDecode`], [`Error::EventParsing`], [`Error::MissingRequiredField`] |
//! | Markup | [`Error::AttributeNumberParsing`], [`Error::AttributeBooleanParsing`], [`Error::UnsupportedAttributeType`], [`Error::UnrecognizedNode`] |
//! | Dispatch | [`Error::ListenerPanic`] |
//! | Action | [`Error::Action`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Http`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// No READY signal arrived after IDENTIFY.
    #[error("Handshake timeout after {timeout_ms}ms")]
    HandshakeTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// No PONG signal arrived after PING.
    #[error("Heartbeat timeout after {timeout_ms}ms")]
    HeartbeatTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Transport failed to open, read or write.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// Connection closed by the remote end or by `close()`.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// A single inbound frame could not be decoded.
    ///
    /// Per-frame and recoverable; the read loop continues.
    #[error("Frame decode error: {message}")]
    FrameDecode {
        /// Description of the decode failure.
        message: String,
    },

    /// Message content of an inbound event could not be parsed.
    #[error("Failed to parse content of event {event_id}: {source}")]
    EventParsing {
        /// Sequence id of the offending event.
        event_id: u64,
        /// Underlying markup error.
        #[source]
        source: Box<Error>,
    },

    /// An event lacks a slot its type requires.
    #[error("Event {event_type} is missing required field `{field}`")]
    MissingRequiredField {
        /// Event type tag.
        event_type: String,
        /// Missing slot name.
        field: &'static str,
    },

    // ========================================================================
    // Markup Errors
    // ========================================================================
    /// Attribute declared numeric holds a non-numeric literal.
    #[error("Attribute `{name}` is not a number: {value:?}")]
    AttributeNumberParsing {
        /// Attribute name.
        name: String,
        /// Offending literal.
        value: String,
    },

    /// Attribute declared boolean holds something other than `true`/`false`.
    #[error("Attribute `{name}` is not a boolean: {value:?}")]
    AttributeBooleanParsing {
        /// Attribute name.
        name: String,
        /// Offending literal.
        value: String,
    },

    /// Attribute value or declared kind the codec cannot represent.
    #[error("Unsupported type `{kind}` for attribute `{name}`")]
    UnsupportedAttributeType {
        /// Attribute name.
        name: String,
        /// Kind that was encountered.
        kind: String,
    },

    /// Markup node that is neither text, element, comment nor declaration.
    #[error("Unrecognized markup node: {snippet}")]
    UnrecognizedNode {
        /// Leading part of the offending node.
        snippet: String,
    },

    // ========================================================================
    // Dispatch Errors
    // ========================================================================
    /// An event listener panicked.
    #[error("Listener {listener} panicked: {message}")]
    ListenerPanic {
        /// Id of the listener.
        listener: String,
        /// Panic payload, if it was a string.
        message: String,
    },

    // ========================================================================
    // Action Errors
    // ========================================================================
    /// Action RPC answered with a non-success status.
    #[error("Action {endpoint} failed with status {status}: {message}")]
    Action {
        /// `resource.method` that was called.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a handshake timeout error.
    #[inline]
    pub fn handshake_timeout(timeout_ms: u64) -> Self {
        Self::HandshakeTimeout { timeout_ms }
    }

    /// Creates a heartbeat timeout error.
    #[inline]
    pub fn heartbeat_timeout(timeout_ms: u64) -> Self {
        Self::HeartbeatTimeout { timeout_ms }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a frame decode error.
    #[inline]
    pub fn frame_decode(message: impl Into<String>) -> Self {
        Self::FrameDecode {
            message: message.into(),
        }
    }

    /// Wraps a markup error raised while decoding event content.
    #[inline]
    pub fn event_parsing(event_id: u64, source: Error) -> Self {
        Self::EventParsing {
            event_id,
            source: Box::new(source),
        }
    }

    /// Creates a missing required field error.
    #[inline]
    pub fn missing_field(event_type: impl Into<String>, field: &'static str) -> Self {
        Self::MissingRequiredField {
            event_type: event_type.into(),
            field,
        }
    }

    /// Creates a number parsing error.
    #[inline]
    pub fn attribute_number(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::AttributeNumberParsing {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates a boolean parsing error.
    #[inline]
    pub fn attribute_boolean(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::AttributeBooleanParsing {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates an unsupported attribute type error.
    #[inline]
    pub fn unsupported_attribute(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnsupportedAttributeType {
            name: name.into(),
            kind: kind.into(),
        }
    }

    /// Creates an unrecognized node error.
    #[inline]
    pub fn unrecognized_node(snippet: impl Into<String>) -> Self {
        Self::UnrecognizedNode {
            snippet: snippet.into(),
        }
    }

    /// Creates a listener panic error.
    #[inline]
    pub fn listener_panic(listener: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ListenerPanic {
            listener: listener.into(),
            message: message.into(),
        }
    }

    /// Creates an action error.
    #[inline]
    pub fn action(endpoint: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Action {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::HandshakeTimeout { .. } | Self::HeartbeatTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::HandshakeTimeout { .. }
                | Self::HeartbeatTimeout { .. }
                | Self::Transport { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error was raised by the markup codec.
    #[inline]
    #[must_use]
    pub fn is_markup_error(&self) -> bool {
        matches!(
            self,
            Self::AttributeNumberParsing { .. }
                | Self::AttributeBooleanParsing { .. }
                | Self::UnsupportedAttributeType { .. }
                | Self::UnrecognizedNode { .. }
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors tear down the current connection and schedule
    /// a reconnection; they never terminate the session.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::HandshakeTimeout { .. }
                | Self::HeartbeatTimeout { .. }
                | Self::Transport { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
                | Self::FrameDecode { .. }
                | Self::EventParsing { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
