//! Client state shared across the UI layer.
//!
//! [`ClientState`] is built once at startup and handed around behind an
//! `Arc`. It owns the device cache, the REST client, the auth session, the
//! socket service and the local stores.

use std::sync::Arc;

use devsync_shared::{Canvas, ListItem, ListItemPatch, PresenceStatus};
use devsync_store::{
    CanvasStore, Clock, DeviceCache, ListsStore, MemoryCache, SqliteCache, StatusStore,
    SystemClock, ThemeStore,
};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::auth::AuthSession;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::socket::{SocketIoTransport, SocketService, SocketTransport};

pub struct ClientState {
    pub config: ClientConfig,
    pub cache: Arc<dyn DeviceCache>,
    pub api: Arc<ApiClient>,
    pub auth: Arc<AuthSession>,
    pub socket: Arc<SocketService>,
    pub canvases: RwLock<CanvasStore>,
    pub lists: RwLock<ListsStore>,
    pub status: RwLock<StatusStore>,
    pub theme: RwLock<ThemeStore>,
}

impl ClientState {
    /// Wire everything together from explicit parts. Stores start with the
    /// sample data.
    pub fn new(
        config: ClientConfig,
        cache: Arc<dyn DeviceCache>,
        transport: Arc<dyn SocketTransport>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let api = Arc::new(ApiClient::new(&config, Arc::clone(&cache))?);
        let auth = Arc::new(AuthSession::new(
            api.clone(),
            Arc::clone(&cache),
            config.revalidate_delay,
        ));
        let socket = Arc::new(SocketService::new(
            config.socket_url.clone(),
            Arc::clone(&cache),
            transport,
        ));

        Ok(Self {
            config,
            cache,
            api,
            auth,
            socket,
            canvases: RwLock::new(CanvasStore::seeded(clock)),
            lists: RwLock::new(ListsStore::seeded()),
            status: RwLock::new(StatusStore::new()),
            theme: RwLock::new(ThemeStore::new()),
        })
    }

    /// Production wiring: Socket.IO transport, system clock, and a SQLite
    /// cache when a cache path is configured.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let cache: Arc<dyn DeviceCache> = match &config.cache_path {
            Some(path) => {
                info!(path = %path.display(), "Using SQLite device cache");
                Arc::new(SqliteCache::open_at(path)?)
            }
            None => Arc::new(MemoryCache::new()),
        };

        Self::new(
            config,
            cache,
            Arc::new(SocketIoTransport::new()),
            Arc::new(SystemClock),
        )
    }

    /// Restore the session and, if signed in, open the socket.
    ///
    /// Returns the background re-validation task when one was scheduled.
    pub async fn start(&self) -> Option<JoinHandle<()>> {
        let revalidation = self.auth.restore().await;

        if self.auth.is_authenticated() {
            if let Err(e) = self.socket.connect().await {
                warn!(error = %e, "Realtime updates unavailable");
            }
        }
        revalidation
    }

    /// Sign out and close the socket.
    pub async fn logout(&self) {
        self.socket.disconnect().await;
        self.auth.logout().await;
    }

    /// Change the local presence and push it to the server.
    pub async fn set_presence(&self, status: PresenceStatus) -> Result<()> {
        self.status.write().await.set_status(status);

        if self.auth.is_authenticated() {
            self.auth.update_user_status(status.into(), None).await?;
        }
        self.socket.update_status(status.as_str()).await
    }

    /// Save locally, then broadcast the new canvas.
    pub async fn save_canvas(&self, canvas: Canvas) -> Result<Canvas> {
        let saved = self.canvases.write().await.save_canvas(canvas).clone();
        let data = serde_json::to_value(&saved)?;
        self.socket.update_canvas(&saved.id, data).await?;
        Ok(saved)
    }

    /// Patch a list item locally, then broadcast it. Returns `None` for an
    /// unknown id.
    pub async fn update_list_item(&self, id: &str, patch: ListItemPatch) -> Result<Option<ListItem>> {
        let updated = {
            let mut lists = self.lists.write().await;
            if !lists.update_item(id, patch) {
                return Ok(None);
            }
            lists.get_item(id).cloned()
        };

        if let Some(item) = &updated {
            let data = serde_json::to_value(item)?;
            self.socket.update_list(id, data).await?;
        }
        Ok(updated)
    }
}
