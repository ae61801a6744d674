//! Entity models held by the client stores.
//!
//! Field names serialize in camelCase so cached JSON and realtime payloads
//! stay compatible with the JavaScript clients.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{BlockType, Priority, SharePermission, ShareTarget, UserStatus};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// The signed-in user's profile as returned by `/users/profile`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub is_online: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::timestamp::option::deserialize"
    )]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// "First Last" when both parts are known, otherwise the username.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            _ => self.username.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// A free-form document made of ordered content blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Canvas {
    pub id: String,
    pub title: String,
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub starred: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default)]
    pub blocks: Vec<CanvasBlock>,
    /// Comment threads keyed by block id.
    #[serde(default)]
    pub comments: BTreeMap<String, Vec<CanvasComment>>,
    #[serde(default)]
    pub shared_with: Vec<CanvasShare>,
}

impl Canvas {
    /// An empty, unsaved canvas with a fresh id.
    pub fn new(title: impl Into<String>, template: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            updated_at: now,
            starred: false,
            template,
            blocks: Vec::new(),
            comments: BTreeMap::new(),
            shared_with: Vec::new(),
        }
    }

    pub fn block(&self, block_id: &str) -> Option<&CanvasBlock> {
        self.blocks.iter().find(|b| b.id == block_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanvasBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockType,
    /// Text for textual blocks, a URI for media blocks.
    pub content: String,
}

impl CanvasBlock {
    pub fn new(kind: BlockType, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanvasComment {
    pub id: String,
    pub text: String,
    pub avatar: String,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CanvasShare {
    pub target_id: String,
    pub target_type: ShareTarget,
    pub permission: SharePermission,
    pub name: String,
}

// ---------------------------------------------------------------------------
// List items
// ---------------------------------------------------------------------------

/// A task-like record shown on the lists board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub id: String,
    pub title: String,
    pub assignee: String,
    pub due_date: String,
    pub priority: Priority,
    /// Board column name, e.g. "To Do", "In Progress", "Done".
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub comments: Vec<ItemComment>,
    #[serde(default)]
    pub completed: bool,
}

impl ListItem {
    pub fn from_new(id: String, new: NewListItem) -> Self {
        Self {
            id,
            title: new.title,
            assignee: new.assignee,
            due_date: new.due_date,
            priority: new.priority,
            status: new.status,
            tags: new.tags,
            description: new.description,
            subtasks: new.subtasks,
            comments: new.comments,
            completed: new.completed,
        }
    }

    /// Merge every field present in `patch` into this item.
    pub fn apply(&mut self, patch: ListItemPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(assignee) = patch.assignee {
            self.assignee = assignee;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(subtasks) = patch.subtasks {
            self.subtasks = subtasks;
        }
        if let Some(comments) = patch.comments {
            self.comments = comments;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemComment {
    pub id: String,
    pub text: String,
    pub author: String,
    pub time: String,
}

/// Partial update of a [`ListItem`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<Subtask>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<ItemComment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ListItemPatch {
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A list item before an id has been assigned.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewListItem {
    pub title: String,
    pub assignee: String,
    pub due_date: String,
    pub priority: Priority,
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(default)]
    pub comments: Vec<ItemComment>,
    #[serde(default)]
    pub completed: bool,
}

// ---------------------------------------------------------------------------
// Chat messages
// ---------------------------------------------------------------------------

/// A chat message held by a conversation screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn new(sender: impl Into<String>, text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender: sender.into(),
            timestamp: now,
            reactions: Vec::new(),
            attachments: Vec::new(),
        }
    }

    /// Toggle `user`'s `emoji` reaction. Empty reactions are dropped.
    pub fn toggle_reaction(&mut self, emoji: &str, user: &str) {
        match self.reactions.iter_mut().find(|r| r.emoji == emoji) {
            Some(reaction) => {
                if let Some(pos) = reaction.users.iter().position(|u| u == user) {
                    reaction.users.remove(pos);
                } else {
                    reaction.users.push(user.to_string());
                }
            }
            None => self.reactions.push(Reaction {
                emoji: emoji.to_string(),
                users: vec![user.to_string()],
            }),
        }
        self.reactions.retain(|r| !r.users.is_empty());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reaction {
    pub emoji: String,
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub uri: String,
    #[serde(rename = "type")]
    pub kind: BlockType,
}
