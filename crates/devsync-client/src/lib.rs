//! # devsync-client
//!
//! Data layer of the DevSync app: REST client, auth session, realtime
//! socket and the [`ClientState`] container that ties them to the local
//! stores.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod socket;
pub mod state;

use devsync_shared::constants::APP_NAME;
use tracing_subscriber::{fmt, EnvFilter};

pub use api::{ApiClient, AuthBackend};
pub use auth::{AuthSession, SessionState};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use socket::{LoopbackTransport, SocketIoTransport, SocketService, SocketTransport};
pub use state::ClientState;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Calling this twice is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("devsync_client=debug,devsync_store=info,warn"));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(app = APP_NAME, "Starting client");
    }
}
