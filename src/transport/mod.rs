//! Transport layer.
//!
//! Events reach the client over one of two transports:
//!
//! ```text
//! ┌──────────────┐   WebSocket <base>/<version>/events   ┌──────────────┐
//! │   Server     │──────────────────────────────────────►│ SessionEngine│
//! │              │                                       └──────┬───────┘
//! │              │   HTTP POST <webhook path>            ┌──────▼───────┐
//! │              │──────────────────────────────────────►│  Dispatcher  │
//! └──────────────┘                                       └──────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | [`Connector`] trait, frame sessions, WebSocket connector |
//! | `memory` | In-process connector for tests and embedding |
//! | `webhook` | Inbound HTTP listener |

// ============================================================================
// Submodules
// ============================================================================

/// Frame sessions and the WebSocket connector.
pub mod connection;

/// In-process transport.
pub mod memory;

/// Inbound HTTP listener.
pub mod webhook;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{
    Connector, DEFAULT_CONNECT_TIMEOUT, FrameSink, FrameStream, TransportSession, WebSocketConnector,
};
pub use memory::{MemoryConnector, MemoryServer, ServerConnection};
pub use webhook::WebhookServer;
