//! Event channel protocol types.
//!
//! This module defines the signal envelope exchanged over the event channel
//! and the domain events and resources it carries.
//!
//! # Protocol Overview
//!
//! | Signal | Direction | Purpose |
//! |--------|-----------|---------|
//! | `Identify` | Client → Server | Authenticate, optionally resume |
//! | `Ready` | Server → Client | Handshake complete, active logins |
//! | `Ping` | Client → Server | Heartbeat |
//! | `Pong` | Server → Client | Heartbeat reply |
//! | `Event` | Server → Client | Domain event |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `signal` | Op-coded envelope |
//! | `event` | Domain event envelope |
//! | `resource` | Users, guilds, channels, messages, logins |

// ============================================================================
// Submodules
// ============================================================================

/// Domain event envelope.
pub mod event;

/// Platform resources.
pub mod resource;

/// Signal envelope.
pub mod signal;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::Event;
pub use resource::{
    Argv, Button, Channel, ChannelType, Guild, GuildMember, GuildRole, Login, Message, Status,
    User,
};
pub use signal::{Identify, Opcode, Ready, Signal};
