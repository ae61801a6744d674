//! Socket.IO transport over websocket.

use async_trait::async_trait;
use futures::FutureExt;
use rust_socketio::asynchronous::{Client, ClientBuilder};
use rust_socketio::{Event, Payload, TransportType};
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use super::transport::{SocketTransport, TransportEvent};
use crate::error::{ClientError, Result};

#[derive(Default)]
pub struct SocketIoTransport {
    client: Mutex<Option<Client>>,
}

impl SocketIoTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

/// First JSON argument of a Socket.IO packet, or `Null` when there is none.
fn first_value(payload: Payload) -> Option<Value> {
    match payload {
        Payload::Text(mut values) => Some(if values.is_empty() {
            Value::Null
        } else {
            values.swap_remove(0)
        }),
        _ => None,
    }
}

#[async_trait]
impl SocketTransport for SocketIoTransport {
    async fn connect(
        &self,
        url: &str,
        token: Option<String>,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<()> {
        let mut slot = self.client.lock().await;
        if let Some(stale) = slot.take() {
            debug!("Replacing previous Socket.IO client");
            if let Err(e) = stale.disconnect().await {
                debug!(error = %e, "Closing previous Socket.IO client failed");
            }
        }

        let on_connect = events.clone();
        let on_close = events.clone();
        let on_error = events.clone();
        let on_any = events;

        let builder = ClientBuilder::new(url)
            .transport_type(TransportType::Websocket)
            .auth(json!({ "token": token }))
            .on(Event::Connect, move |_payload, _client| {
                let _ = on_connect.send(TransportEvent::Connected);
                async {}.boxed()
            })
            .on(Event::Close, move |_payload, _client| {
                let _ = on_close.send(TransportEvent::Disconnected);
                async {}.boxed()
            })
            .on(Event::Error, move |payload, _client| {
                let message = match first_value(payload) {
                    Some(Value::String(s)) => s,
                    Some(other) => other.to_string(),
                    None => "binary error payload".to_string(),
                };
                let _ = on_error.send(TransportEvent::Error(message));
                async {}.boxed()
            })
            .on_any(move |event, payload, _client| {
                if let Event::Custom(name) = event {
                    match first_value(payload) {
                        Some(payload) => {
                            let _ = on_any.send(TransportEvent::Event { name, payload });
                        }
                        None => debug!(event = %name, "Ignoring binary payload"),
                    }
                }
                async {}.boxed()
            });

        let client = builder
            .connect()
            .await
            .map_err(|e| ClientError::Socket(e.to_string()))?;

        info!(url, "Socket.IO connected");
        *slot = Some(client);
        Ok(())
    }

    async fn emit(&self, event: &str, payload: Value) -> Result<()> {
        let slot = self.client.lock().await;
        let client = slot
            .as_ref()
            .ok_or_else(|| ClientError::Socket("not connected".into()))?;
        client
            .emit(event, payload)
            .await
            .map_err(|e| ClientError::Socket(e.to_string()))
    }

    async fn disconnect(&self) -> Result<()> {
        let Some(client) = self.client.lock().await.take() else {
            return Ok(());
        };
        client
            .disconnect()
            .await
            .map_err(|e| ClientError::Socket(e.to_string()))
    }
}
