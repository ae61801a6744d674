use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SharedError;

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum using the
/// same spellings serde uses on the wire.
macro_rules! wire_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = SharedError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(SharedError::unknown($kind, other)),
                }
            }
        }
    };
}

/// Account status as reported by the REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[default]
    Active,
    Away,
    DoNotDisturb,
    Offline,
}

wire_enum!(UserStatus, "user status", {
    Active => "ACTIVE",
    Away => "AWAY",
    DoNotDisturb => "DO_NOT_DISTURB",
    Offline => "OFFLINE",
});

/// The three-way status picker shown on the profile screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    #[default]
    Active,
    Away,
    Dnd,
}

wire_enum!(PresenceStatus, "presence status", {
    Active => "active",
    Away => "away",
    Dnd => "dnd",
});

impl PresenceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Away => "Away",
            Self::Dnd => "Do not disturb",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Active => "#4CAF50",
            Self::Away => "#FFA726",
            Self::Dnd => "#F44336",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Active => "\u{1F7E2}",
            Self::Away => "\u{1F7E1}",
            Self::Dnd => "\u{1F534}",
        }
    }
}

impl From<PresenceStatus> for UserStatus {
    fn from(status: PresenceStatus) -> Self {
        match status {
            PresenceStatus::Active => UserStatus::Active,
            PresenceStatus::Away => UserStatus::Away,
            PresenceStatus::Dnd => UserStatus::DoNotDisturb,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

wire_enum!(Priority, "priority", {
    Low => "low",
    Medium => "medium",
    High => "high",
});

/// Content kind of a canvas block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Header,
    #[default]
    Text,
    List,
    Image,
    File,
    Video,
    Audio,
    Link,
    Embed,
}

wire_enum!(BlockType, "block type", {
    Header => "header",
    Text => "text",
    List => "list",
    Image => "image",
    File => "file",
    Video => "video",
    Audio => "audio",
    Link => "link",
    Embed => "embed",
});

impl BlockType {
    /// Whether the block content is a URI to a media resource rather than text.
    pub fn is_media(&self) -> bool {
        matches!(
            self,
            Self::Image | Self::File | Self::Video | Self::Audio | Self::Link | Self::Embed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareTarget {
    Channel,
    Dm,
    User,
}

wire_enum!(ShareTarget, "share target", {
    Channel => "channel",
    Dm => "dm",
    User => "user",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    #[default]
    View,
    Edit,
}

wire_enum!(SharePermission, "share permission", {
    View => "view",
    Edit => "edit",
});

/// Message kind accepted by the REST message endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    File,
    Audio,
    Video,
    System,
}

wire_enum!(MessageKind, "message kind", {
    Text => "TEXT",
    Image => "IMAGE",
    File => "FILE",
    Audio => "AUDIO",
    Video => "VIDEO",
    System => "SYSTEM",
});

/// State of the realtime connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}
