//! Client configuration loaded from environment variables.
//!
//! Every setting has a default so the client starts with zero configuration
//! against the development backend.

use std::path::PathBuf;
use std::time::Duration;

use devsync_shared::constants::{
    DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_REVALIDATE_DELAY_MS,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// REST base URL, including the `/api` prefix.
    /// Env: `DEVSYNC_API_URL`
    /// Default: `http://10.132.169.243:8080/api`
    pub api_url: String,

    /// Socket.IO server URL.
    /// Env: `DEVSYNC_SOCKET_URL`
    /// Default: `api_url` without its trailing `/api`.
    pub socket_url: String,

    /// Delay before a restored session is checked against the backend.
    /// Env: `DEVSYNC_REVALIDATE_MS`
    pub revalidate_delay: Duration,

    /// Per-request timeout for REST calls.
    /// Env: `DEVSYNC_REQUEST_TIMEOUT_SECS`
    pub request_timeout: Duration,

    /// SQLite file for the device cache. `None` keeps the cache in memory.
    /// Env: `DEVSYNC_CACHE_PATH`
    pub cache_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_api_url(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    /// Defaults for every setting except the API URL.
    pub fn for_api_url(api_url: impl Into<String>) -> Self {
        let api_url = normalize_url(&api_url.into());
        Self {
            socket_url: socket_url_for(&api_url),
            api_url,
            revalidate_delay: Duration::from_millis(DEFAULT_REVALIDATE_DELAY_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            cache_path: None,
        }
    }

    /// Load configuration from the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut config = match var("DEVSYNC_API_URL") {
            Some(url) => Self::for_api_url(url),
            None => Self::default(),
        };

        if let Some(url) = var("DEVSYNC_SOCKET_URL") {
            config.socket_url = normalize_url(&url);
        }

        if let Some(val) = var("DEVSYNC_REVALIDATE_MS") {
            match val.parse::<u64>() {
                Ok(ms) => config.revalidate_delay = Duration::from_millis(ms),
                Err(_) => tracing::warn!(value = %val, "Invalid DEVSYNC_REVALIDATE_MS, using default"),
            }
        }

        if let Some(val) = var("DEVSYNC_REQUEST_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    value = %val,
                    "Invalid DEVSYNC_REQUEST_TIMEOUT_SECS, using default"
                ),
            }
        }

        if let Some(path) = var("DEVSYNC_CACHE_PATH") {
            config.cache_path = Some(PathBuf::from(path));
        }

        config
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn socket_url_for(api_url: &str) -> String {
    api_url
        .strip_suffix("/api")
        .unwrap_or(api_url)
        .to_string()
}
