//! REST client for the DevSync backend.
//!
//! Authenticated calls read the bearer token from the device cache on every
//! request, so a token written by `login` is picked up immediately and a
//! cleared cache signs every later request out.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, debug_span, info, warn, Instrument};

use devsync_shared::constants::{
    keys, BYPASS_TOKEN_PREFIX, BYPASS_USER_ID, DEFAULT_PAGE_SIZE, SLOW_REQUEST_THRESHOLD_MS,
};
use devsync_shared::rest::{
    ApiMessage, AuthResponse, Channel, CreateChannelRequest, CreateWorkspaceRequest,
    ForgotPasswordRequest, JoinWorkspaceRequest, MessageResponse, Page, ResetPasswordRequest,
    SendMessageRequest, SigninRequest, SignupRequest, Workspace, WorkspaceChannel,
};
use devsync_shared::{MessageKind, User, UserStatus};
use devsync_store::DeviceCache;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// The backend operations the auth session depends on.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse>;

    async fn signup(&self, username: &str, email: &str, password: &str) -> Result<MessageResponse>;

    /// End the backend session and drop the stored token.
    async fn logout(&self) -> Result<()>;

    async fn bypass_auth(&self) -> Result<AuthResponse>;

    /// Whether the stored token is still accepted.
    async fn is_authenticated(&self) -> Result<bool>;

    async fn user_profile(&self) -> Result<User>;

    async fn update_user_status(
        &self,
        status: UserStatus,
        is_online: Option<bool>,
    ) -> Result<MessageResponse>;
}

/// Thin `reqwest` wrapper over the DevSync REST endpoints.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    cache: Arc<dyn DeviceCache>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, cache: Arc<dyn DeviceCache>) -> Result<Self> {
        match reqwest::Url::parse(&config.api_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(ClientError::Config(format!(
                    "API URL must be http or https, got {}",
                    url.scheme()
                )));
            }
            Err(e) => {
                return Err(ClientError::Config(format!(
                    "invalid API URL {}: {e}",
                    config.api_url
                )));
            }
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        info!(base_url = %config.api_url, "API client ready");

        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            cache,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    /// `POST /auth/signin`. Stores `authToken` and `userId` on success.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        let req = self
            .request(Method::POST, "/auth/signin")
            .json(&SigninRequest {
                username: username.to_string(),
                password: password.to_string(),
            });
        let resp = self.send(req).await?;

        let auth: AuthResponse = handle_response(resp).await?;
        self.store_credentials(&auth)?;
        info!(user_id = auth.id, username = %auth.username, "Signed in");
        Ok(auth)
    }

    /// Offline login: fabricates a bypass token and user without a request.
    pub async fn bypass_auth(&self) -> Result<AuthResponse> {
        let auth = AuthResponse {
            token: format!("{BYPASS_TOKEN_PREFIX}{}", Utc::now().timestamp_millis()),
            token_type: "Bearer".to_string(),
            id: BYPASS_USER_ID,
            username: "bypass-user".to_string(),
            email: "bypass@devsync.com".to_string(),
            roles: vec!["ROLE_USER".to_string()],
        };
        self.store_credentials(&auth)?;
        warn!("Using bypass authentication");
        Ok(auth)
    }

    /// `POST /auth/signup`.
    pub async fn signup(&self, username: &str, email: &str, password: &str) -> Result<MessageResponse> {
        let body = SignupRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: None,
        };
        debug!(username, email, "Signup request");

        let req = self
            .request(Method::POST, "/auth/signup")
            .json(&body);
        let resp = self.send(req).await?;

        debug!(status = resp.status().as_u16(), "Signup response");
        handle_response(resp).await
    }

    /// `POST /auth/signout`. The stored token and user id are removed even
    /// when the request fails; the request error is still returned.
    pub async fn logout(&self) -> Result<()> {
        let sent = match self.authed(Method::POST, "/auth/signout") {
            Ok(req) => self.send(req).await.map(|_| ()),
            Err(e) => Err(e),
        };

        self.cache.multi_remove(&[keys::AUTH_TOKEN, keys::USER_ID])?;
        sent
    }

    /// Bypass tokens are always valid; anything else is checked with
    /// `GET /auth/verify`. Network failures count as "not authenticated".
    pub async fn is_authenticated(&self) -> Result<bool> {
        let Some(token) = self.token()? else {
            return Ok(false);
        };
        if token.starts_with(BYPASS_TOKEN_PREFIX) {
            return Ok(true);
        }

        match self.send(self.authed(Method::GET, "/auth/verify")?).await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => {
                debug!(error = %e, "Token verification request failed");
                Ok(false)
            }
        }
    }

    /// `POST /auth/forgot-password`.
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let req = self
            .request(Method::POST, "/auth/forgot-password")
            .json(&ForgotPasswordRequest {
                email: email.to_string(),
            });
        let resp = self.send(req).await?;
        check_response(resp).await.map(|_| ())
    }

    /// `POST /auth/reset-password`.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
        let req = self
            .request(Method::POST, "/auth/reset-password")
            .json(&ResetPasswordRequest {
                token: token.to_string(),
                new_password: new_password.to_string(),
            });
        let resp = self.send(req).await?;
        check_response(resp).await.map(|_| ())
    }

    /// `POST /auth/refresh`. Replaces the stored token with the new one.
    pub async fn refresh_token(&self) -> Result<AuthResponse> {
        if self.token()?.is_none() {
            return Err(ClientError::NotAuthenticated);
        }
        let resp = self.send(self.authed(Method::POST, "/auth/refresh")?).await?;
        let auth: AuthResponse = handle_response(resp).await?;
        self.store_credentials(&auth)?;
        Ok(auth)
    }

    pub fn current_user_id(&self) -> Result<Option<i64>> {
        Ok(self
            .cache
            .get_item(keys::USER_ID)?
            .and_then(|raw| raw.parse().ok()))
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// `GET /users/profile`, or the fixed bypass user for bypass tokens.
    pub async fn user_profile(&self) -> Result<User> {
        if let Some(token) = self.token()? {
            if token.starts_with(BYPASS_TOKEN_PREFIX) {
                return Ok(bypass_user());
            }
        }
        self.get_json("/users/profile").await
    }

    pub async fn online_users(&self) -> Result<Vec<User>> {
        self.get_json("/users/online").await
    }

    /// `PUT /users/status?status=..[&isOnline=..]`.
    pub async fn update_user_status(
        &self,
        status: UserStatus,
        is_online: Option<bool>,
    ) -> Result<MessageResponse> {
        let mut query = vec![("status", status.as_str().to_string())];
        if let Some(online) = is_online {
            query.push(("isOnline", online.to_string()));
        }

        let req = self
            .authed(Method::PUT, "/users/status")?
            .query(&query);
        let resp = self.send(req).await?;
        handle_response(resp).await
    }

    /// `PUT /users/firebase-token?token=..`: register the push token.
    pub async fn update_firebase_token(&self, token: &str) -> Result<MessageResponse> {
        let req = self
            .authed(Method::PUT, "/users/firebase-token")?
            .query(&[("token", token)]);
        let resp = self.send(req).await?;
        handle_response(resp).await
    }

    // ------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------

    pub async fn user_channels(&self) -> Result<Vec<Channel>> {
        self.get_json("/channels").await
    }

    pub async fn create_channel(
        &self,
        name: &str,
        description: &str,
        is_private: bool,
    ) -> Result<Channel> {
        let req = self
            .authed(Method::POST, "/channels")?
            .json(&CreateChannelRequest {
                name: name.to_string(),
                description: description.to_string(),
                is_private,
            });
        let resp = self.send(req).await?;
        handle_response(resp).await
    }

    pub async fn join_channel(&self, channel_id: i64) -> Result<MessageResponse> {
        let req = self
            .authed(Method::POST, &format!("/channels/{channel_id}/join"))?;
        let resp = self.send(req).await?;
        handle_response(resp).await
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    pub async fn channel_messages(
        &self,
        channel_id: i64,
        page: u32,
        size: Option<u32>,
    ) -> Result<Page<ApiMessage>> {
        self.paged(&format!("/messages/channel/{channel_id}"), page, size)
            .await
    }

    pub async fn direct_messages(
        &self,
        user_id: i64,
        page: u32,
        size: Option<u32>,
    ) -> Result<Page<ApiMessage>> {
        self.paged(&format!("/messages/direct/{user_id}"), page, size)
            .await
    }

    pub async fn send_channel_message(
        &self,
        channel_id: i64,
        content: &str,
        kind: MessageKind,
    ) -> Result<ApiMessage> {
        self.post_message(&format!("/messages/channel/{channel_id}"), content, kind)
            .await
    }

    pub async fn send_direct_message(
        &self,
        user_id: i64,
        content: &str,
        kind: MessageKind,
    ) -> Result<ApiMessage> {
        self.post_message(&format!("/messages/direct/{user_id}"), content, kind)
            .await
    }

    pub async fn thread_replies(&self, message_id: i64) -> Result<Vec<ApiMessage>> {
        self.get_json(&format!("/messages/{message_id}/replies"))
            .await
    }

    // ------------------------------------------------------------------
    // Workspaces
    // ------------------------------------------------------------------

    /// `GET /workspaces/user`. Falls back to the sample workspaces when the
    /// backend cannot be reached or rejects the call.
    pub async fn user_workspaces(&self) -> Vec<Workspace> {
        match self.get_json("/workspaces/user").await {
            Ok(workspaces) => workspaces,
            Err(e) => {
                warn!(error = %e, "Error fetching workspaces, using sample data");
                Workspace::samples()
            }
        }
    }

    /// `GET /workspaces/:id/channels`, with the same fallback as
    /// [`Self::user_workspaces`].
    pub async fn workspace_channels(&self, workspace_id: i64) -> Vec<WorkspaceChannel> {
        match self
            .get_json(&format!("/workspaces/{workspace_id}/channels"))
            .await
        {
            Ok(channels) => channels,
            Err(e) => {
                warn!(workspace_id, error = %e, "Error fetching channels, using sample data");
                WorkspaceChannel::samples()
            }
        }
    }

    pub async fn create_workspace(&self, name: &str, description: &str) -> Result<Workspace> {
        let req = self
            .authed(Method::POST, "/workspaces")?
            .json(&CreateWorkspaceRequest {
                name: name.to_string(),
                description: description.to_string(),
            });
        let resp = self.send(req).await?;
        handle_response(resp).await
    }

    pub async fn join_workspace(&self, invite_code: &str) -> Result<Workspace> {
        let req = self
            .authed(Method::POST, "/workspaces/join")?
            .json(&JoinWorkspaceRequest {
                invite_code: invite_code.to_string(),
            });
        let resp = self.send(req).await?;
        handle_response(resp).await
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn token(&self) -> Result<Option<String>> {
        Ok(self.cache.get_item(keys::AUTH_TOKEN)?)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.url(path))
    }

    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let req = self.request(method, path);
        Ok(match self.token()? {
            Some(token) => req.bearer_auth(token),
            None => req,
        })
    }

    /// Execute a request, logging its duration and warning when slow.
    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let request = req.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let span = debug_span!("api_request", %method, %path);
        let started = Instant::now();
        let result = self.http.execute(request).instrument(span).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if elapsed_ms > SLOW_REQUEST_THRESHOLD_MS {
            warn!(%method, %path, elapsed_ms, "Slow request");
        } else {
            debug!(%method, %path, elapsed_ms, "Request finished");
        }
        Ok(result?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.send(self.authed(Method::GET, path)?).await?;
        handle_response(resp).await
    }

    async fn paged(&self, path: &str, page: u32, size: Option<u32>) -> Result<Page<ApiMessage>> {
        let size = size.unwrap_or(DEFAULT_PAGE_SIZE);
        let req = self
            .authed(Method::GET, path)?
            .query(&[("page", page), ("size", size)]);
        let resp = self.send(req).await?;
        handle_response(resp).await
    }

    async fn post_message(&self, path: &str, content: &str, kind: MessageKind) -> Result<ApiMessage> {
        let req = self
            .authed(Method::POST, path)?
            .json(&SendMessageRequest {
                content: content.to_string(),
                kind,
            });
        let resp = self.send(req).await?;
        handle_response(resp).await
    }

    fn store_credentials(&self, auth: &AuthResponse) -> Result<()> {
        self.cache.set_item(keys::AUTH_TOKEN, &auth.token)?;
        self.cache.set_item(keys::USER_ID, &auth.id.to_string())?;
        Ok(())
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        ApiClient::login(self, username, password).await
    }

    async fn signup(&self, username: &str, email: &str, password: &str) -> Result<MessageResponse> {
        ApiClient::signup(self, username, email, password).await
    }

    async fn logout(&self) -> Result<()> {
        ApiClient::logout(self).await
    }

    async fn bypass_auth(&self) -> Result<AuthResponse> {
        ApiClient::bypass_auth(self).await
    }

    async fn is_authenticated(&self) -> Result<bool> {
        ApiClient::is_authenticated(self).await
    }

    async fn user_profile(&self) -> Result<User> {
        ApiClient::user_profile(self).await
    }

    async fn update_user_status(
        &self,
        status: UserStatus,
        is_online: Option<bool>,
    ) -> Result<MessageResponse> {
        ApiClient::update_user_status(self, status, is_online).await
    }
}

/// The profile served for bypass tokens.
fn bypass_user() -> User {
    let now = Utc::now();
    User {
        id: BYPASS_USER_ID,
        username: "bypass-user".to_string(),
        email: "bypass@devsync.com".to_string(),
        first_name: Some("Bypass".to_string()),
        last_name: Some("User".to_string()),
        profile_picture: None,
        status: UserStatus::Active,
        is_online: true,
        last_seen: Some(now),
        created_at: now,
        updated_at: now,
    }
}

/// Turn a non-success response into [`ClientError::Api`], using the body's
/// `message` when there is one.
async fn check_response(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let message = resp
        .json::<MessageResponse>()
        .await
        .ok()
        .map(|body| body.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn handle_response<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let resp = check_response(resp).await?;
    Ok(resp.json::<T>().await?)
}
