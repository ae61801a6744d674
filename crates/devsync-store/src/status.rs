//! The signed-in user's presence status as chosen in the status picker.

use devsync_shared::{PresenceStatus, UserStatus};

#[derive(Debug, Clone, Default)]
pub struct StatusStore {
    status: PresenceStatus,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> PresenceStatus {
        self.status
    }

    /// Local only; pushing the change to the backend is the caller's job
    /// (see `AuthSession::update_user_status` and `SocketService::update_status`).
    pub fn set_status(&mut self, status: PresenceStatus) {
        tracing::debug!(status = %status, "presence status changed");
        self.status = status;
    }

    pub fn text(&self) -> &'static str {
        self.status.label()
    }

    pub fn color(&self) -> &'static str {
        self.status.color()
    }

    pub fn emoji(&self) -> &'static str {
        self.status.emoji()
    }

    pub fn api_status(&self) -> UserStatus {
        self.status.into()
    }
}
