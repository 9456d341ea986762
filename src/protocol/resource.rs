//! Platform resources carried in event slots.
//!
//! Field names follow the wire format (`snake_case`); unknown fields are
//! ignored so newer servers stay compatible.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::markup::Element;

// ============================================================================
// User / Guild / Channel
// ============================================================================

/// A platform user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: String,
    /// Account name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    /// Avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Whether the user is a bot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_bot: Option<bool>,
}

/// A guild (server, group).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Guild {
    /// Guild ID.
    pub id: String,
    /// Guild name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Guild avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// A guild member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildMember {
    /// Underlying user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Nickname within the guild.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    /// Guild-specific avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Join time (ms since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<i64>,
}

/// A guild role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildRole {
    /// Role ID.
    pub id: String,
    /// Role name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Kind of channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ChannelType {
    /// Text channel.
    #[default]
    Text,
    /// Direct message.
    Direct,
    /// Category.
    Category,
    /// Voice channel.
    Voice,
}

impl TryFrom<u8> for ChannelType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Text),
            1 => Ok(Self::Direct),
            2 => Ok(Self::Category),
            3 => Ok(Self::Voice),
            other => Err(format!("invalid channel type: {other}")),
        }
    }
}

impl From<ChannelType> for u8 {
    fn from(kind: ChannelType) -> Self {
        kind as u8
    }
}

/// A channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel ID.
    pub id: String,
    /// Channel kind.
    #[serde(default, rename = "type")]
    pub channel_type: ChannelType,
    /// Channel name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Parent channel ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

// ============================================================================
// Message
// ============================================================================

/// A message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message ID.
    pub id: String,
    /// Markup content as sent on the wire.
    #[serde(default)]
    pub content: String,
    /// Content decoded into elements.
    ///
    /// Filled by the session engine and webhook listener before dispatch.
    #[serde(skip)]
    pub elements: Vec<Element>,
    /// Channel the message belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    /// Guild the message belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild: Option<Guild>,
    /// Sender as guild member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<GuildMember>,
    /// Sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Creation time (ms since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Last edit time (ms since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

// ============================================================================
// Login
// ============================================================================

/// Connection status of a login.
///
/// Accepts the numeric code or the upper-case name on input; always
/// written as the numeric code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "u8")]
pub enum Status {
    /// Offline.
    #[default]
    Offline,
    /// Online.
    Online,
    /// Connecting.
    Connect,
    /// Disconnecting.
    Disconnect,
    /// Reconnecting.
    Reconnect,
}

impl Status {
    const ALL: [Self; 5] = [
        Self::Offline,
        Self::Online,
        Self::Connect,
        Self::Disconnect,
        Self::Reconnect,
    ];

    /// Upper-case wire name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Offline => "OFFLINE",
            Self::Online => "ONLINE",
            Self::Connect => "CONNECT",
            Self::Disconnect => "DISCONNECT",
            Self::Reconnect => "RECONNECT",
        }
    }
}

impl TryFrom<Value> for Status {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let found = match &value {
            Value::Number(n) => n
                .as_u64()
                .and_then(|code| Self::ALL.get(usize::try_from(code).ok()?).copied()),
            Value::String(s) => Self::ALL.into_iter().find(|st| st.name() == s),
            _ => None,
        };
        found.ok_or_else(|| format!("invalid login status: {value}"))
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        status as u8
    }
}

/// A bot account logged in on a platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Login {
    /// Bot user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// Bot user ID on the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_id: Option<String>,
    /// Platform name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Connection status.
    #[serde(default)]
    pub status: Status,
}

// ============================================================================
// Interaction
// ============================================================================

/// Button that triggered an interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Button {
    /// Button ID as set in the `button` element.
    pub id: String,
}

/// Parsed command invocation supplied by the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Argv {
    /// Command name.
    pub name: String,
    /// Positional arguments.
    #[serde(default)]
    pub arguments: Vec<Value>,
    /// Named options.
    #[serde(default)]
    pub options: Value,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_status_accepts_code_and_name() {
        let from_code: Status = serde_json::from_value(json!(1)).expect("code");
        let from_name: Status = serde_json::from_value(json!("ONLINE")).expect("name");
        assert_eq!(from_code, Status::Online);
        assert_eq!(from_name, Status::Online);
        assert!(serde_json::from_value::<Status>(json!(9)).is_err());
        assert!(serde_json::from_value::<Status>(json!("AWAY")).is_err());
    }

    #[test]
    fn test_status_serializes_as_code() {
        assert_eq!(serde_json::to_value(Status::Reconnect).expect("serialize"), json!(4));
    }

    #[test]
    fn test_channel_type_codes() {
        let channel: Channel =
            serde_json::from_value(json!({"id": "c1", "type": 1})).expect("channel");
        assert_eq!(channel.channel_type, ChannelType::Direct);
        assert!(serde_json::from_value::<Channel>(json!({"id": "c", "type": 7})).is_err());
    }

    #[test]
    fn test_message_ignores_unknown_fields() {
        let message: Message = serde_json::from_value(json!({
            "id": "m1",
            "content": "hi",
            "extra": {"nested": true}
        }))
        .expect("message");
        assert_eq!(message.id, "m1");
        assert_eq!(message.content, "hi");
        assert!(message.elements.is_empty());
    }

    #[test]
    fn test_login_round_trip() {
        let login: Login = serde_json::from_value(json!({
            "platform": "x",
            "self_id": "1",
            "status": "ONLINE"
        }))
        .expect("login");
        let value = serde_json::to_value(&login).expect("serialize");
        assert_eq!(value, json!({"platform": "x", "self_id": "1", "status": 1}));
    }
}
