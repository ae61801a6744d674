//! In-process transport. Records what the client emits and lets the caller
//! play the server side.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use super::transport::{SocketTransport, TransportEvent};
use crate::error::{ClientError, Result};

#[derive(Default)]
pub struct LoopbackTransport {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    events: Option<mpsc::UnboundedSender<TransportEvent>>,
    emitted: Vec<(String, Value)>,
    last_token: Option<String>,
    last_url: Option<String>,
    refuse: bool,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make subsequent `connect` calls fail.
    pub fn refuse_connections(&self, refuse: bool) {
        self.inner().refuse = refuse;
    }

    /// Deliver a server event. Returns `false` when no client is connected.
    pub fn push(&self, event: &str, payload: Value) -> bool {
        match &self.inner().events {
            Some(tx) => tx
                .send(TransportEvent::Event {
                    name: event.to_string(),
                    payload,
                })
                .is_ok(),
            None => false,
        }
    }

    /// Report a transport error to the client without closing.
    pub fn push_error(&self, message: &str) -> bool {
        match &self.inner().events {
            Some(tx) => tx.send(TransportEvent::Error(message.to_string())).is_ok(),
            None => false,
        }
    }

    /// Close the connection from the server side.
    pub fn drop_connection(&self) {
        if let Some(tx) = self.inner().events.take() {
            let _ = tx.send(TransportEvent::Disconnected);
        }
    }

    /// Everything emitted so far, oldest first.
    pub fn emitted(&self) -> Vec<(String, Value)> {
        self.inner().emitted.clone()
    }

    pub fn last_token(&self) -> Option<String> {
        self.inner().last_token.clone()
    }

    pub fn last_url(&self) -> Option<String> {
        self.inner().last_url.clone()
    }

    pub fn is_open(&self) -> bool {
        self.inner().events.is_some()
    }
}

#[async_trait]
impl SocketTransport for LoopbackTransport {
    async fn connect(
        &self,
        url: &str,
        token: Option<String>,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<()> {
        let mut inner = self.inner();
        if inner.refuse {
            return Err(ClientError::Socket("connection refused".into()));
        }
        inner.last_url = Some(url.to_string());
        inner.last_token = token;
        inner.events = Some(events);
        Ok(())
    }

    async fn emit(&self, event: &str, payload: Value) -> Result<()> {
        let mut inner = self.inner();
        if inner.events.is_none() {
            return Err(ClientError::Socket("not connected".into()));
        }
        inner.emitted.push((event.to_string(), payload));
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.inner().events = None;
        Ok(())
    }
}
