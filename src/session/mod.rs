//! Session layer.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `engine` | Handshake, heartbeat and reconnection state machine |
//! | `dispatcher` | Event listener registry |
//! | `options` | Token and timing options |
//! | `state` | Lifecycle states |

// ============================================================================
// Submodules
// ============================================================================

/// Event listener registry.
pub mod dispatcher;

/// Session state machine.
pub mod engine;

/// Session options.
pub mod options;

/// Lifecycle states.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use dispatcher::{Dispatcher, EventListener};
pub use engine::SessionEngine;
pub use options::SessionOptions;
pub use state::SessionState;
