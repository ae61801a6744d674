//! Request and response bodies of the DevSync REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::User;
use crate::types::MessageKind;

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Always sent as `null`; the backend assigns the default role.
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Body of a successful `/auth/signin` or `/auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub token: String,
    #[serde(rename = "type", default = "bearer")]
    pub token_type: String,
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

fn bearer() -> String {
    "Bearer".to_string()
}

/// `{ "message": "..." }`, used both for acknowledgements and error bodies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Channels and messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelType {
    #[default]
    Public,
    Private,
    DirectMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    pub created_by: User,
    #[serde(default)]
    pub members: Vec<User>,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelRequest {
    pub name: String,
    pub description: String,
    pub is_private: bool,
}

/// A message as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiMessage {
    pub id: i64,
    pub content: String,
    pub sender: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_message: Option<Box<ApiMessage>>,
    #[serde(default)]
    pub replies: Vec<ApiMessage>,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub is_edited: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::timestamp::option::deserialize"
    )]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

/// One page of a paged query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub last: bool,
}

// ---------------------------------------------------------------------------
// Workspaces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub logo: Option<String>,
}

impl Workspace {
    /// Shown while the backend cannot be reached.
    pub fn samples() -> Vec<Workspace> {
        vec![
            Workspace {
                id: 1,
                name: "DevTeam Workspace".into(),
                description: "Main development workspace".into(),
                member_count: 25,
                logo: None,
            },
            Workspace {
                id: 2,
                name: "Design Team".into(),
                description: "Creative design discussions".into(),
                member_count: 12,
                logo: None,
            },
        ]
    }
}

/// Channel summary listed inside a workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceChannel {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: ChannelType,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub last_message: Option<String>,
}

impl WorkspaceChannel {
    /// Shown while the backend cannot be reached.
    pub fn samples() -> Vec<WorkspaceChannel> {
        vec![
            WorkspaceChannel {
                id: 1,
                name: "general".into(),
                description: "General discussions".into(),
                kind: ChannelType::Public,
                unread_count: 3,
                last_message: Some("Welcome to the team!".into()),
            },
            WorkspaceChannel {
                id: 2,
                name: "development".into(),
                description: "Development discussions".into(),
                kind: ChannelType::Public,
                unread_count: 0,
                last_message: Some("Code review completed".into()),
            },
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JoinWorkspaceRequest {
    pub invite_code: String,
}
