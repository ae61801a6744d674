use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Result;

/// What a transport reports back to the socket service.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The connection was (re-)established by the transport itself.
    Connected,
    /// The server or network closed the connection.
    Disconnected,
    /// A transport-level error. The connection may still be up.
    Error(String),
    /// A named server event with its decoded JSON payload.
    Event { name: String, payload: Value },
}

/// A realtime connection to the DevSync server.
///
/// `connect` resolves once the connection is usable; afterwards everything
/// the server pushes is forwarded to `events` until `disconnect`.
#[async_trait]
pub trait SocketTransport: Send + Sync {
    async fn connect(
        &self,
        url: &str,
        token: Option<String>,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<()>;

    async fn emit(&self, event: &str, payload: Value) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;
}
