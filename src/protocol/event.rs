//! Domain events.
//!
//! Every event shares one envelope. Which resource slots are populated
//! depends on the event type; the `require_*` accessors narrow an event to
//! the slots its type guarantees.
//!
//! # Event Types
//!
//! | Type | Required slots |
//! |------|----------------|
//! | `message-created`, `message-updated`, `message-deleted` | `channel`, `message`, `user` |
//! | `reaction-added`, `reaction-removed` | `channel`, `message`, `user` |
//! | `guild-added`, `guild-updated`, `guild-removed`, `guild-request` | `guild` |
//! | `guild-member-added`, `guild-member-updated`, `guild-member-removed`, `guild-member-request` | `guild`, `user` |
//! | `guild-role-created`, `guild-role-updated`, `guild-role-deleted` | `guild`, `role` |
//! | `login-added`, `login-removed`, `login-updated` | `login` |
//! | `friend-request` | `user` |
//! | `interaction/button` | `button` |
//! | `interaction/command` | `channel`, `user` |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::markup::MarkupCodec;

use super::resource::{Argv, Button, Channel, Guild, GuildMember, GuildRole, Login, Message, User};

// ============================================================================
// Event Type Constants
// ============================================================================

/// A message was sent.
pub const MESSAGE_CREATED: &str = "message-created";
/// A message was edited.
pub const MESSAGE_UPDATED: &str = "message-updated";
/// A message was deleted.
pub const MESSAGE_DELETED: &str = "message-deleted";
/// A button was clicked.
pub const INTERACTION_BUTTON: &str = "interaction/button";
/// A platform command was invoked.
pub const INTERACTION_COMMAND: &str = "interaction/command";
/// A login was added.
pub const LOGIN_ADDED: &str = "login-added";
/// A login was removed.
pub const LOGIN_REMOVED: &str = "login-removed";
/// A login changed status.
pub const LOGIN_UPDATED: &str = "login-updated";

// ============================================================================
// Event
// ============================================================================

/// An event delivered by the server.
///
/// # Format
///
/// ```json
/// {
///   "id": 12,
///   "type": "message-created",
///   "platform": "discord",
///   "self_id": "1234",
///   "timestamp": 1700000000000,
///   "channel": { "id": "c1", "type": 0 },
///   "user": { "id": "u1" },
///   "message": { "id": "m1", "content": "<at id=\"1234\"/> hi" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence number, used as the resume cursor.
    pub id: u64,

    /// Event type tag.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Platform the event originates from.
    #[serde(default)]
    pub platform: String,

    /// Bot account the event was delivered to.
    #[serde(default)]
    pub self_id: String,

    /// Event time (ms since epoch).
    #[serde(default)]
    pub timestamp: u64,

    /// Original JSON text, kept for diagnostics.
    #[serde(skip)]
    pub raw: String,

    /// Channel slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    /// Guild slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild: Option<Guild>,
    /// Member slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<GuildMember>,
    /// Message slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    /// User slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Role slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<GuildRole>,
    /// Login slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<Login>,
    /// Button slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<Button>,
    /// Command slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argv: Option<Argv>,
    /// Operator slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<User>,
}

impl Event {
    /// Decodes an event from its JSON text, keeping the text in [`Event::raw`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the text is not a valid event.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut event: Self = serde_json::from_str(text)?;
        event.raw = text.to_owned();
        Ok(event)
    }

    /// Decodes the message content into [`Message::elements`].
    ///
    /// Events without a message slot are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EventParsing`] wrapping the markup error.
    pub fn decode_content(&mut self, codec: &MarkupCodec) -> Result<()> {
        let id = self.id;
        if let Some(message) = self.message.as_mut() {
            message.elements = codec
                .decode(&message.content)
                .map_err(|e| Error::event_parsing(id, e))?;
        }
        Ok(())
    }

    /// Slots that events of `event_type` always carry.
    #[must_use]
    pub fn required_slots(event_type: &str) -> &'static [&'static str] {
        match event_type {
            "message-created" | "message-updated" | "message-deleted" | "reaction-added"
            | "reaction-removed" => &["channel", "message", "user"],
            "guild-added" | "guild-updated" | "guild-removed" | "guild-request" => &["guild"],
            "guild-member-added"
            | "guild-member-updated"
            | "guild-member-removed"
            | "guild-member-request" => &["guild", "user"],
            "guild-role-created" | "guild-role-updated" | "guild-role-deleted" => {
                &["guild", "role"]
            }
            "login-added" | "login-removed" | "login-updated" => &["login"],
            "friend-request" => &["user"],
            "interaction/button" => &["button"],
            "interaction/command" => &["channel", "user"],
            _ => &[],
        }
    }

    /// Checks that every slot required by the event type is present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRequiredField`] naming the first absent slot.
    pub fn validate(&self) -> Result<()> {
        match Self::required_slots(&self.event_type)
            .iter()
            .find(|slot| !self.has_slot(slot))
        {
            Some(slot) => Err(Error::missing_field(&self.event_type, slot)),
            None => Ok(()),
        }
    }

    /// Returns `true` if the named slot is populated.
    #[must_use]
    pub fn has_slot(&self, slot: &str) -> bool {
        match slot {
            "channel" => self.channel.is_some(),
            "guild" => self.guild.is_some(),
            "member" => self.member.is_some(),
            "message" => self.message.is_some(),
            "user" => self.user.is_some(),
            "role" => self.role.is_some(),
            "login" => self.login.is_some(),
            "button" => self.button.is_some(),
            "argv" => self.argv.is_some(),
            "operator" => self.operator.is_some(),
            _ => false,
        }
    }

    /// Returns `true` for `message-*` events.
    #[inline]
    #[must_use]
    pub fn is_message_event(&self) -> bool {
        self.event_type.starts_with("message-")
    }

    fn require<'a, T>(&self, slot: &'a Option<T>, name: &'static str) -> Result<&'a T> {
        slot.as_ref()
            .ok_or_else(|| Error::missing_field(&self.event_type, name))
    }

    /// Channel slot, or [`Error::MissingRequiredField`].
    pub fn require_channel(&self) -> Result<&Channel> {
        self.require(&self.channel, "channel")
    }

    /// Guild slot, or [`Error::MissingRequiredField`].
    pub fn require_guild(&self) -> Result<&Guild> {
        self.require(&self.guild, "guild")
    }

    /// Member slot, or [`Error::MissingRequiredField`].
    pub fn require_member(&self) -> Result<&GuildMember> {
        self.require(&self.member, "member")
    }

    /// Message slot, or [`Error::MissingRequiredField`].
    pub fn require_message(&self) -> Result<&Message> {
        self.require(&self.message, "message")
    }

    /// User slot, or [`Error::MissingRequiredField`].
    pub fn require_user(&self) -> Result<&User> {
        self.require(&self.user, "user")
    }

    /// Role slot, or [`Error::MissingRequiredField`].
    pub fn require_role(&self) -> Result<&GuildRole> {
        self.require(&self.role, "role")
    }

    /// Login slot, or [`Error::MissingRequiredField`].
    pub fn require_login(&self) -> Result<&Login> {
        self.require(&self.login, "login")
    }

    /// Button slot, or [`Error::MissingRequiredField`].
    pub fn require_button(&self) -> Result<&Button> {
        self.require(&self.button, "button")
    }

    /// Command slot, or [`Error::MissingRequiredField`].
    pub fn require_argv(&self) -> Result<&Argv> {
        self.require(&self.argv, "argv")
    }

    /// Operator slot, or [`Error::MissingRequiredField`].
    pub fn require_operator(&self) -> Result<&User> {
        self.require(&self.operator, "operator")
    }
}

// ============================================================================
// Tests
// ============================================================================
