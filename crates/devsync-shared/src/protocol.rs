//! Realtime events exchanged with the DevSync Socket.IO endpoint.
//!
//! Event names are plain strings on the wire. Payload keys are camelCase.
//! Ids may arrive as JSON strings or numbers depending on the sender, so
//! every id field goes through [`WireId`].

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::rest::ApiMessage;
use crate::types::UserStatus;

/// Events pushed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundEvent {
    NewMessage,
    MessageUpdated,
    MessageDeleted,
    UserTyping,
    UserStopTyping,
    UserOnline,
    UserOffline,
    ChannelUpdated,
    CanvasUpdated,
    ListUpdated,
}

impl InboundEvent {
    pub const ALL: [InboundEvent; 10] = [
        Self::NewMessage,
        Self::MessageUpdated,
        Self::MessageDeleted,
        Self::UserTyping,
        Self::UserStopTyping,
        Self::UserOnline,
        Self::UserOffline,
        Self::ChannelUpdated,
        Self::CanvasUpdated,
        Self::ListUpdated,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::NewMessage => "new_message",
            Self::MessageUpdated => "message_updated",
            Self::MessageDeleted => "message_deleted",
            Self::UserTyping => "user_typing",
            Self::UserStopTyping => "user_stop_typing",
            Self::UserOnline => "user_online",
            Self::UserOffline => "user_offline",
            Self::ChannelUpdated => "channel_updated",
            Self::CanvasUpdated => "canvas_updated",
            Self::ListUpdated => "list_updated",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }
}

impl fmt::Display for InboundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Events emitted by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutboundEvent {
    SendMessage,
    StartTyping,
    StopTyping,
    UpdateStatus,
    JoinChannel,
    LeaveChannel,
    UpdateCanvas,
    UpdateList,
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SendMessage => "send_message",
            Self::StartTyping => "start_typing",
            Self::StopTyping => "stop_typing",
            Self::UpdateStatus => "update_status",
            Self::JoinChannel => "join_channel",
            Self::LeaveChannel => "leave_channel",
            Self::UpdateCanvas => "update_canvas",
            Self::UpdateList => "update_list",
        }
    }
}

impl fmt::Display for OutboundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// An entity id normalized to a string. Deserializes from a JSON string or
/// integer; serializes as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WireId(pub String);

impl<'de> Deserialize<'de> for WireId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Int(i64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(s) => WireId(s),
            Repr::Int(n) => WireId(n.to_string()),
        })
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WireId {
    fn from(s: &str) -> Self {
        WireId(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Inbound payloads
// ---------------------------------------------------------------------------

/// Payload of `new_message` and `message_updated`.
pub type MessagePayload = ApiMessage;

/// Payload of `message_deleted`: either a bare id or `{ "messageId": .. }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDeleted {
    pub message_id: WireId,
}

impl<'de> Deserialize<'de> for MessageDeleted {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bare(WireId),
            Wrapped {
                #[serde(rename = "messageId")]
                message_id: WireId,
            },
        }

        let message_id = match Repr::deserialize(deserializer)? {
            Repr::Bare(id) => id,
            Repr::Wrapped { message_id } => message_id,
        };
        Ok(MessageDeleted { message_id })
    }
}

/// Payload of `user_typing` and `user_stop_typing`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypingEvent {
    pub channel_id: WireId,
    #[serde(default)]
    pub user_id: Option<WireId>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Payload of `user_online` and `user_offline`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEvent {
    #[serde(alias = "id")]
    pub user_id: WireId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub status: Option<UserStatus>,
}

/// Payload of `channel_updated`. Unknown keys are kept in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelUpdate {
    pub id: WireId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Payload of `canvas_updated` and `update_canvas`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanvasUpdate {
    pub canvas_id: WireId,
    #[serde(default)]
    pub data: Value,
}

/// Payload of `list_updated` and `update_list`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListUpdate {
    pub list_id: WireId,
    #[serde(default)]
    pub data: Value,
}

// ---------------------------------------------------------------------------
// Outbound payloads
// ---------------------------------------------------------------------------

/// Payload of `send_message`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub channel_id: WireId,
    pub content: String,
    /// Lower-case content kind, `"text"` unless the client says otherwise.
    #[serde(rename = "type")]
    pub kind: String,
}

/// Payload of `start_typing`, `stop_typing`, `join_channel`, `leave_channel`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRef {
    pub channel_id: WireId,
}

/// Payload of `update_status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: String,
}
