//! Op-coded signal envelope.
//!
//! Every frame on the event channel is one signal:
//!
//! ```json
//! { "op": 3, "body": { "token": "T0", "sequence": null } }
//! ```
//!
//! | Op | Signal | Body |
//! |----|--------|------|
//! | 0 | `Event` | event payload |
//! | 1 | `Ping` | none |
//! | 2 | `Pong` | none |
//! | 3 | `Identify` | `{ token?, sequence? }` |
//! | 4 | `Ready` | `{ logins: [...] }` |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

use super::event::Event;
use super::resource::Login;

// ============================================================================
// Opcode
// ============================================================================

/// Numeric signal discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Domain event.
    Event = 0,
    /// Heartbeat request.
    Ping = 1,
    /// Heartbeat reply.
    Pong = 2,
    /// Authentication.
    Identify = 3,
    /// Handshake completion.
    Ready = 4,
}

impl Opcode {
    /// Wire code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u64> for Opcode {
    type Error = Error;

    fn try_from(code: u64) -> Result<Self> {
        match code {
            0 => Ok(Self::Event),
            1 => Ok(Self::Ping),
            2 => Ok(Self::Pong),
            3 => Ok(Self::Identify),
            4 => Ok(Self::Ready),
            other => Err(Error::frame_decode(format!("unknown op {other}"))),
        }
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Body of an `Identify` signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identify {
    /// Opaque access token.
    #[serde(default)]
    pub token: Option<String>,
    /// Resume cursor: id of the last event seen.
    #[serde(default)]
    pub sequence: Option<u64>,
}

/// Body of a `Ready` signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ready {
    /// Logins active on the server.
    #[serde(default)]
    pub logins: Vec<Login>,
}

// ============================================================================
// Signal
// ============================================================================

/// One frame of the event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Domain event.
    Event(Box<Event>),
    /// Heartbeat request.
    Ping,
    /// Heartbeat reply.
    Pong,
    /// Authentication, first client frame after the transport opens.
    Identify(Identify),
    /// Handshake completion.
    Ready(Ready),
}

/// Wire form of a signal before the body is interpreted.
#[derive(Debug, Serialize, Deserialize)]
struct RawSignal {
    op: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<Value>,
}

impl Signal {
    /// Creates an `Identify` signal.
    #[inline]
    #[must_use]
    pub fn identify(token: Option<String>, sequence: Option<u64>) -> Self {
        Self::Identify(Identify { token, sequence })
    }

    /// Returns the opcode of this signal.
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Event(_) => Opcode::Event,
            Self::Ping => Opcode::Ping,
            Self::Pong => Opcode::Pong,
            Self::Identify(_) => Opcode::Identify,
            Self::Ready(_) => Opcode::Ready,
        }
    }

    /// Encodes the signal as one JSON frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the body cannot be serialized.
    pub fn encode(&self) -> Result<String> {
        let body = match self {
            Self::Event(event) => Some(serde_json::to_value(event)?),
            Self::Ping | Self::Pong => None,
            Self::Identify(identify) => Some(serde_json::to_value(identify)?),
            Self::Ready(ready) => Some(serde_json::to_value(ready)?),
        };

        let raw = RawSignal {
            op: u64::from(self.opcode().code()),
            body,
        };
        Ok(serde_json::to_string(&raw)?)
    }

    /// Decodes one JSON frame.
    ///
    /// For events the body text is kept in [`Event::raw`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameDecode`] if the frame is not JSON, carries an
    /// unknown op, or its body does not match the op.
    pub fn decode(frame: &str) -> Result<Self> {
        let raw: RawSignal = serde_json::from_str(frame)
            .map_err(|e| Error::frame_decode(format!("invalid envelope: {e}")))?;

        match Opcode::try_from(raw.op)? {
            Opcode::Ping => Ok(Self::Ping),
            Opcode::Pong => Ok(Self::Pong),
            Opcode::Event => {
                let body = raw
                    .body
                    .ok_or_else(|| Error::frame_decode("event signal without body"))?;
                let text = body.to_string();
                let mut event: Event = serde_json::from_value(body)
                    .map_err(|e| Error::frame_decode(format!("invalid event body: {e}")))?;
                event.raw = text;
                Ok(Self::Event(Box::new(event)))
            }
            Opcode::Identify => {
                let identify = Self::body_or_default(raw.body, "identify")?;
                Ok(Self::Identify(identify))
            }
            Opcode::Ready => {
                let ready = Self::body_or_default(raw.body, "ready")?;
                Ok(Self::Ready(ready))
            }
        }
    }

    fn body_or_default<T>(body: Option<Value>, name: &str) -> Result<T>
    where
        T: Default + for<'de> Deserialize<'de>,
    {
        match body {
            None | Some(Value::Null) => Ok(T::default()),
            Some(value) => serde_json::from_value(value)
                .map_err(|e| Error::frame_decode(format!("invalid {name} body: {e}"))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
