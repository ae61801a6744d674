//! Realtime channel to the DevSync server.
//!
//! [`SocketService`] owns one transport connection at a time. Server events
//! are pulled off the transport's channel by a spawned dispatch task and
//! handed to the typed handlers registered with the `on_*` methods.
//! Emitting while disconnected is a silent no-op.

mod loopback;
mod socketio;
mod transport;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use devsync_shared::constants::keys;
use devsync_shared::protocol::{
    CanvasUpdate, ChannelRef, ChannelUpdate, InboundEvent, ListUpdate, MessageDeleted,
    MessagePayload, OutboundEvent, PresenceEvent, SendMessage, StatusUpdate, TypingEvent, WireId,
};
use devsync_shared::ConnectionState;
use devsync_store::DeviceCache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::Result;

pub use loopback::LoopbackTransport;
pub use socketio::SocketIoTransport;
pub use transport::{SocketTransport, TransportEvent};

type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

/// State shared with the dispatch task.
struct Shared {
    handlers: RwLock<HashMap<InboundEvent, Vec<Handler>>>,
    state: watch::Sender<ConnectionState>,
}

impl Shared {
    fn handlers_for(&self, event: InboundEvent) -> Vec<Handler> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event)
            .cloned()
            .unwrap_or_default()
    }
}

pub struct SocketService {
    url: String,
    cache: Arc<dyn DeviceCache>,
    transport: Arc<dyn SocketTransport>,
    shared: Arc<Shared>,
    dispatch: Mutex<Option<JoinHandle<()>>>,
}

impl SocketService {
    pub fn new(
        url: impl Into<String>,
        cache: Arc<dyn DeviceCache>,
        transport: Arc<dyn SocketTransport>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            url: url.into(),
            cache,
            transport,
            shared: Arc::new(Shared {
                handlers: RwLock::new(HashMap::new()),
                state,
            }),
            dispatch: Mutex::new(None),
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Open the connection using the cached auth token.
    ///
    /// Does nothing if already connected. A failed connect leaves the
    /// service disconnected and returns the transport error.
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected() {
            debug!("Socket already connected");
            return Ok(());
        }

        // Left behind by a server-side close. The transport must take the
        // new event channel, not keep the dead one.
        let stale = self.dispatch_slot().take();
        if let Some(old) = stale {
            old.abort();
            if let Err(e) = self.transport.disconnect().await {
                debug!(error = %e, "Closing stale socket failed");
            }
        }

        let token = self.token();
        let (tx, rx) = mpsc::unbounded_channel();

        if let Err(e) = self.transport.connect(&self.url, token, tx).await {
            error!(url = %self.url, error = %e, "Socket connection error");
            return Err(e);
        }

        // Published before the dispatch task starts so an early close from
        // the transport is not overwritten.
        self.shared.state.send_replace(ConnectionState::Connected);

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(dispatch_loop(shared, rx));
        if let Some(old) = self.dispatch_slot().replace(handle) {
            old.abort();
        }

        info!(url = %self.url, "Socket connected");
        Ok(())
    }

    /// Close the connection. Registered handlers are kept for the next
    /// `connect`.
    pub async fn disconnect(&self) {
        if let Err(e) = self.transport.disconnect().await {
            warn!(error = %e, "Socket close failed");
        }
        if let Some(handle) = self.dispatch_slot().take() {
            handle.abort();
        }
        self.shared.state.send_replace(ConnectionState::Disconnected);
        info!("Socket disconnected");
    }

    /// Remove every handler registered for `event`.
    pub fn off(&self, event: InboundEvent) {
        self.shared
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&event);
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    pub fn on_new_message<F>(&self, handler: F)
    where
        F: Fn(MessagePayload) + Send + Sync + 'static,
    {
        self.on(InboundEvent::NewMessage, handler);
    }

    pub fn on_message_update<F>(&self, handler: F)
    where
        F: Fn(MessagePayload) + Send + Sync + 'static,
    {
        self.on(InboundEvent::MessageUpdated, handler);
    }

    pub fn on_message_delete<F>(&self, handler: F)
    where
        F: Fn(MessageDeleted) + Send + Sync + 'static,
    {
        self.on(InboundEvent::MessageDeleted, handler);
    }

    pub fn on_typing<F>(&self, handler: F)
    where
        F: Fn(TypingEvent) + Send + Sync + 'static,
    {
        self.on(InboundEvent::UserTyping, handler);
    }

    pub fn on_stop_typing<F>(&self, handler: F)
    where
        F: Fn(TypingEvent) + Send + Sync + 'static,
    {
        self.on(InboundEvent::UserStopTyping, handler);
    }

    pub fn on_user_online<F>(&self, handler: F)
    where
        F: Fn(PresenceEvent) + Send + Sync + 'static,
    {
        self.on(InboundEvent::UserOnline, handler);
    }

    pub fn on_user_offline<F>(&self, handler: F)
    where
        F: Fn(PresenceEvent) + Send + Sync + 'static,
    {
        self.on(InboundEvent::UserOffline, handler);
    }

    pub fn on_channel_update<F>(&self, handler: F)
    where
        F: Fn(ChannelUpdate) + Send + Sync + 'static,
    {
        self.on(InboundEvent::ChannelUpdated, handler);
    }

    pub fn on_canvas_update<F>(&self, handler: F)
    where
        F: Fn(CanvasUpdate) + Send + Sync + 'static,
    {
        self.on(InboundEvent::CanvasUpdated, handler);
    }

    pub fn on_list_update<F>(&self, handler: F)
    where
        F: Fn(ListUpdate) + Send + Sync + 'static,
    {
        self.on(InboundEvent::ListUpdated, handler);
    }

    /// Register a handler that receives the decoded payload of `event`.
    pub fn on<T, F>(&self, event: InboundEvent, handler: F)
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let wrapped: Handler = Arc::new(move |payload: &Value| match T::deserialize(payload) {
            Ok(value) => handler(value),
            Err(e) => warn!(event = %event, error = %e, "Dropping undecodable payload"),
        });

        self.shared
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event)
            .or_default()
            .push(wrapped);
    }

    // ------------------------------------------------------------------
    // Emits
    // ------------------------------------------------------------------

    /// Send a chat message. `kind` defaults to `"text"`.
    pub async fn send_message(&self, channel_id: &str, content: &str, kind: Option<&str>) -> Result<()> {
        let payload = SendMessage {
            channel_id: channel_id.into(),
            content: content.to_string(),
            kind: kind.unwrap_or("text").to_string(),
        };
        self.emit(OutboundEvent::SendMessage, &payload).await
    }

    pub async fn start_typing(&self, channel_id: &str) -> Result<()> {
        self.emit(OutboundEvent::StartTyping, &channel_ref(channel_id)).await
    }

    pub async fn stop_typing(&self, channel_id: &str) -> Result<()> {
        self.emit(OutboundEvent::StopTyping, &channel_ref(channel_id)).await
    }

    pub async fn update_status(&self, status: &str) -> Result<()> {
        let payload = StatusUpdate {
            status: status.to_string(),
        };
        self.emit(OutboundEvent::UpdateStatus, &payload).await
    }

    pub async fn join_channel(&self, channel_id: &str) -> Result<()> {
        self.emit(OutboundEvent::JoinChannel, &channel_ref(channel_id)).await
    }

    pub async fn leave_channel(&self, channel_id: &str) -> Result<()> {
        self.emit(OutboundEvent::LeaveChannel, &channel_ref(channel_id)).await
    }

    pub async fn update_canvas(&self, canvas_id: &str, data: Value) -> Result<()> {
        let payload = CanvasUpdate {
            canvas_id: canvas_id.into(),
            data,
        };
        self.emit(OutboundEvent::UpdateCanvas, &payload).await
    }

    pub async fn update_list(&self, list_id: &str, data: Value) -> Result<()> {
        let payload = ListUpdate {
            list_id: list_id.into(),
            data,
        };
        self.emit(OutboundEvent::UpdateList, &payload).await
    }

    async fn emit<T: Serialize>(&self, event: OutboundEvent, payload: &T) -> Result<()> {
        if !self.is_connected() {
            debug!(event = %event, "Socket not connected, dropping emit");
            return Ok(());
        }
        let value = serde_json::to_value(payload)?;
        self.transport.emit(event.name(), value).await
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn token(&self) -> Option<String> {
        for key in [keys::AUTH_TOKEN, keys::USER_TOKEN] {
            match self.cache.get_item(key) {
                Ok(Some(token)) => return Some(token),
                Ok(None) => {}
                Err(e) => warn!(key, error = %e, "Failed to read socket token"),
            }
        }
        None
    }

    fn dispatch_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.dispatch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SocketService {
    fn drop(&mut self) {
        if let Some(handle) = self.dispatch_slot().take() {
            handle.abort();
        }
    }
}

fn channel_ref(channel_id: &str) -> ChannelRef {
    ChannelRef {
        channel_id: WireId::from(channel_id),
    }
}

/// Pull transport events until the channel closes.
async fn dispatch_loop(shared: Arc<Shared>, mut rx: mpsc::UnboundedReceiver<TransportEvent>) {
    debug!("Socket dispatch started");

    while let Some(event) = rx.recv().await {
        match event {
            TransportEvent::Connected => {
                shared.state.send_replace(ConnectionState::Connected);
                info!("Socket reconnected");
            }
            TransportEvent::Disconnected => {
                shared.state.send_replace(ConnectionState::Disconnected);
                info!("Socket closed by server");
            }
            TransportEvent::Error(message) => {
                error!(error = %message, "Socket error");
            }
            TransportEvent::Event { name, payload } => {
                let Some(event) = InboundEvent::from_name(&name) else {
                    debug!(event = %name, "Ignoring unknown socket event");
                    continue;
                };
                for handler in shared.handlers_for(event) {
                    handler(&payload);
                }
            }
        }
    }

    debug!("Socket dispatch ended");
}
