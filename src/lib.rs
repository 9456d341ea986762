//! Chatlink - Client runtime for an op-coded chat event protocol.
//!
//! This library keeps a long-lived event session to a chat server, delivers
//! events to registered listeners, and translates message content between a
//! typed element tree and its tag-based text form.
//!
//! # Architecture
//!
//! The client follows a session/listener model:
//!
//! - **Event session**: WebSocket at `<base>/<version>/events`, op-coded
//!   signals (Event, Ping, Pong, Identify, Ready)
//! - **Webhook**: the server POSTs one event per request instead
//! - **Actions**: HTTP POST to `<base>/<version>/<resource>.<method>`
//!
//! Key design principles:
//!
//! - One session task per [`SessionEngine`]: handshake, heartbeat, reconnect
//! - Events are delivered to the [`Dispatcher`] strictly in arrival order
//! - Message content is decoded against an explicit [`ElementRegistry`]
//! - A bad frame or bad message content drops one event, never the session
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatlink::{Client, Event, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::builder()
//!         .endpoint("https://chat.example.com")
//!         .token("secret")
//!         .platform("discord")
//!         .self_id("1234")
//!         .build()?;
//!
//!     client.on("message-created", |event: Arc<Event>| async move {
//!         let message = event.require_message()?;
//!         println!("{}", chatlink::markup::plain_text(&message.elements));
//!         Ok::<(), chatlink::Error>(())
//!     });
//!
//!     client.connect()?;
//!     client.wait_terminated().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`action`] | Action RPC client |
//! | [`client`] | Client entry point and configuration |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`markup`] | Element tree and markup codec |
//! | [`protocol`] | Signals, events and resources |
//! | [`session`] | Session engine and dispatcher |
//! | [`transport`] | WebSocket, in-memory and webhook transports |

// ============================================================================
// Modules
// ============================================================================

/// Action RPC client.
pub mod action;

/// Client entry point and configuration.
///
/// Use [`Client::builder()`] to create a configured client.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Element tree and markup codec.
///
/// - [`Element`] - One node of message content
/// - [`MarkupCodec`] - Tree to text and back
/// - [`ElementRegistry`] - Per-tag attribute schema
pub mod markup;

/// Wire signals, events and resources.
pub mod protocol;

/// Session engine and event dispatch.
pub mod session;

/// Transports delivering events.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use action::ActionClient;
pub use client::{Client, ClientBuilder};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::ListenerId;

// Markup types
pub use markup::{Element, ElementRegistry, MarkupCodec, standard_registry};

// Protocol types
pub use protocol::{Event, Signal};

// Session types
pub use session::{Dispatcher, EventListener, SessionEngine, SessionOptions, SessionState};

// Transport types
pub use transport::{Connector, WebSocketConnector, WebhookServer};
