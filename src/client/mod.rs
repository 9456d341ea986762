//! Client entry point.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Session, dispatcher and actions of one bot account |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`SessionOptions`] | Handshake, heartbeat and reconnect timing |
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use chatlink::{Client, Result, SessionOptions};
//!
//! # async fn example() -> Result<()> {
//! let client = Client::builder()
//!     .endpoint("wss://chat.example.com")
//!     .token("secret")
//!     .options(SessionOptions::new().with_heartbeat_interval(Duration::from_secs(30)))
//!     .build()?;
//!
//! client.connect()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// Core client implementation.
pub mod core;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{ClientBuilder, DEFAULT_VERSION};
pub use core::Client;
pub use crate::session::SessionOptions;
