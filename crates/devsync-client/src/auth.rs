//! Auth session: the signed-in user, mirrored into the device cache.
//!
//! State lives in a [`watch`] channel so UI layers can observe changes with
//! [`AuthSession::subscribe`]. Backend failures in `login`, `signup`,
//! `bypass_auth` and `update_user_status` propagate to the caller; `logout`,
//! `refresh_user` and the background re-validation only log.

use std::sync::Arc;
use std::time::Duration;

use devsync_shared::constants::keys;
use devsync_shared::{User, UserStatus};
use devsync_store::cache::DeviceCacheExt;
use devsync_store::DeviceCache;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::AuthBackend;
use crate::error::{ClientError, Result};

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub is_loading: bool,
    pub is_authenticated: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            // Loading until the first restore attempt finishes.
            is_loading: true,
            is_authenticated: false,
        }
    }
}

pub struct AuthSession {
    backend: Arc<dyn AuthBackend>,
    cache: Arc<dyn DeviceCache>,
    state: watch::Sender<SessionState>,
    revalidate_delay: Duration,
}

/// Clears `is_loading` when dropped, whichever way the operation exits.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<SessionState>,
}

impl<'a> LoadingGuard<'a> {
    fn start(state: &'a watch::Sender<SessionState>) -> Self {
        state.send_modify(|s| s.is_loading = true);
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.is_loading = false);
    }
}

impl AuthSession {
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        cache: Arc<dyn DeviceCache>,
        revalidate_delay: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            backend,
            cache,
            state,
            revalidate_delay,
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Restore a session at startup.
    ///
    /// With a cached user and token the session is marked authenticated
    /// straight away and the token is re-checked in the background after
    /// the configured delay; the returned handle can abort that check.
    /// Otherwise the backend is asked directly.
    pub async fn restore(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let _loading = LoadingGuard::start(&self.state);

        if let Some(user) = self.cached_user() {
            info!(user_id = user.id, "Restored cached session");
            self.set_signed_in(user);

            let session = Arc::clone(self);
            return Some(tokio::spawn(async move {
                tokio::time::sleep(session.revalidate_delay).await;
                session.revalidate().await;
            }));
        }

        if let Err(e) = self.restore_from_backend().await {
            error!(error = %e, "Auth check failed");
            if let Err(e) = self.backend.logout().await {
                debug!(error = %e, "Logout after failed auth check also failed");
            }
            self.set_signed_out();
        }
        None
    }

    /// Sign in, then load and cache the profile.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let _loading = LoadingGuard::start(&self.state);

        self.backend.login(username, password).await?;
        let profile = self.backend.user_profile().await?;
        self.cache.set_json(keys::CACHED_USER, &profile)?;
        self.set_signed_in(profile);
        Ok(())
    }

    pub async fn signup(&self, username: &str, email: &str, password: &str) -> Result<()> {
        let _loading = LoadingGuard::start(&self.state);

        let resp = self.backend.signup(username, email, password).await?;
        info!(username, message = %resp.message, "Account created");
        Ok(())
    }

    /// End the session. Local state and cache are cleared even when the
    /// backend call fails; failures are logged.
    pub async fn logout(&self) {
        let _loading = LoadingGuard::start(&self.state);

        if let Err(e) = self.backend.logout().await {
            error!(error = %e, "Logout error");
        }
        self.set_signed_out();
        self.clear_cache();
        info!("Signed out");
    }

    /// Sign in with the offline bypass account.
    pub async fn bypass_auth(&self) -> Result<()> {
        let _loading = LoadingGuard::start(&self.state);

        let result = async {
            self.backend.bypass_auth().await?;
            let profile = self.backend.user_profile().await?;
            self.cache.set_json(keys::CACHED_USER, &profile)?;
            self.set_signed_in(profile);
            Ok::<(), ClientError>(())
        }
        .await;

        if let Err(ref e) = result {
            error!(error = %e, "Bypass auth failed");
        }
        result
    }

    /// Push a status change to the backend, then mirror it locally.
    pub async fn update_user_status(&self, status: UserStatus, is_online: Option<bool>) -> Result<()> {
        if let Err(e) = self.backend.update_user_status(status, is_online).await {
            error!(error = %e, status = %status, "Status update failed");
            return Err(e);
        }

        let mut updated = None;
        self.state.send_modify(|s| {
            if let Some(user) = s.user.as_mut() {
                user.status = status;
                user.is_online = is_online.unwrap_or(user.is_online);
                updated = Some(user.clone());
            }
        });

        if let Some(user) = updated {
            self.cache.set_json(keys::CACHED_USER, &user)?;
        }
        Ok(())
    }

    /// Reload the profile from the backend. Failures are logged.
    pub async fn refresh_user(&self) {
        let profile = match self.backend.user_profile().await {
            Ok(profile) => profile,
            Err(e) => {
                error!(error = %e, "User refresh failed");
                return;
            }
        };

        if let Err(e) = self.cache.set_json(keys::CACHED_USER, &profile) {
            warn!(error = %e, "Failed to cache refreshed profile");
        }
        self.state.send_modify(|s| s.user = Some(profile));
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// The cached user, if both it and a token are present and readable.
    fn cached_user(&self) -> Option<User> {
        let token = match self.cache.get_item(keys::AUTH_TOKEN) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read cached token");
                return None;
            }
        };
        token.as_ref()?;

        match self.cache.get_json::<User>(keys::CACHED_USER) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable cached user");
                None
            }
        }
    }

    async fn restore_from_backend(&self) -> Result<()> {
        if !self.backend.is_authenticated().await? {
            debug!("No existing session");
            self.set_signed_out();
            return Ok(());
        }

        let profile = self.backend.user_profile().await?;
        self.cache.set_json(keys::CACHED_USER, &profile)?;
        self.set_signed_in(profile);
        Ok(())
    }

    async fn revalidate(&self) {
        match self.backend.is_authenticated().await {
            Ok(true) => debug!("Cached session still valid"),
            Ok(false) => {
                info!("Cached session rejected, signing out");
                if let Err(e) = self.backend.logout().await {
                    debug!(error = %e, "Backend logout failed during revalidation");
                }
                self.set_signed_out();
                self.clear_cache();
            }
            Err(e) => error!(error = %e, "Background auth check failed"),
        }
    }

    fn set_signed_in(&self, user: User) {
        self.state.send_modify(|s| {
            s.user = Some(user);
            s.is_authenticated = true;
        });
    }

    fn set_signed_out(&self) {
        self.state.send_modify(|s| {
            s.user = None;
            s.is_authenticated = false;
        });
    }

    fn clear_cache(&self) {
        if let Err(e) = self.cache.multi_remove(&keys::SESSION_KEYS) {
            warn!(error = %e, "Failed to clear cached session");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use devsync_shared::rest::{AuthResponse, MessageResponse};
    use devsync_store::MemoryCache;

    use super::*;

    fn user(id: i64) -> User {
        let now = Utc::now();
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@devsync.com"),
            first_name: None,
            last_name: None,
            profile_picture: None,
            status: UserStatus::Active,
            is_online: true,
            last_seen: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Scripted backend that writes credentials like the real client does.
    struct FakeBackend {
        cache: Arc<dyn DeviceCache>,
        token_valid: AtomicBool,
        fail_login: bool,
        fail_logout: bool,
        verify_errors: bool,
        logouts: AtomicUsize,
    }

    impl FakeBackend {
        fn new(cache: Arc<dyn DeviceCache>) -> Self {
            Self {
                cache,
                token_valid: AtomicBool::new(true),
                fail_login: false,
                fail_logout: false,
                verify_errors: false,
                logouts: AtomicUsize::new(0),
            }
        }
    }

    fn api_error(status: u16, message: &str) -> ClientError {
        ClientError::Api {
            status,
            message: message.to_string(),
        }
    }

    #[async_trait]
    impl AuthBackend for FakeBackend {
        async fn login(&self, username: &str, _password: &str) -> Result<AuthResponse> {
            if self.fail_login {
                return Err(api_error(401, "Bad credentials"));
            }
            self.cache.set_item(keys::AUTH_TOKEN, "token-1")?;
            self.cache.set_item(keys::USER_ID, "1")?;
            Ok(AuthResponse {
                token: "token-1".into(),
                token_type: "Bearer".into(),
                id: 1,
                username: username.into(),
                email: "user1@devsync.com".into(),
                roles: vec![],
            })
        }

        async fn signup(&self, _u: &str, _e: &str, _p: &str) -> Result<MessageResponse> {
            Ok(MessageResponse {
                message: "User registered successfully!".into(),
            })
        }

        async fn logout(&self) -> Result<()> {
            self.logouts.fetch_add(1, Ordering::SeqCst);
            self.cache.multi_remove(&[keys::AUTH_TOKEN, keys::USER_ID])?;
            if self.fail_logout {
                return Err(api_error(500, "boom"));
            }
            Ok(())
        }

        async fn bypass_auth(&self) -> Result<AuthResponse> {
            self.cache.set_item(keys::AUTH_TOKEN, "bypass-token-1")?;
            Ok(AuthResponse {
                token: "bypass-token-1".into(),
                token_type: "Bearer".into(),
                id: 999,
                username: "bypass-user".into(),
                email: "bypass@devsync.com".into(),
                roles: vec!["ROLE_USER".into()],
            })
        }

        async fn is_authenticated(&self) -> Result<bool> {
            if self.verify_errors {
                return Err(ClientError::Socket("verify exploded".into()));
            }
            Ok(self.cache.get_item(keys::AUTH_TOKEN)?.is_some()
                && self.token_valid.load(Ordering::SeqCst))
        }

        async fn user_profile(&self) -> Result<User> {
            Ok(user(1))
        }

        async fn update_user_status(
            &self,
            _status: UserStatus,
            _is_online: Option<bool>,
        ) -> Result<MessageResponse> {
            Ok(MessageResponse::default())
        }
    }

    fn session_with(backend: FakeBackend, cache: Arc<MemoryCache>) -> Arc<AuthSession> {
        Arc::new(AuthSession::new(
            Arc::new(backend),
            cache,
            Duration::from_millis(1_000),
        ))
    }

    #[tokio::test]
    async fn login_caches_profile() {
        let cache = Arc::new(MemoryCache::new());
        let session = session_with(FakeBackend::new(cache.clone()), cache.clone());

        session.login("user1", "pw").await.unwrap();

        assert!(session.is_authenticated());
        assert!(!session.is_loading());
        let cached: Option<User> = cache.get_json(keys::CACHED_USER).unwrap();
        assert_eq!(cached.map(|u| u.id), Some(1));
    }

    #[tokio::test]
    async fn failed_login_propagates_and_stops_loading() {
        let cache = Arc::new(MemoryCache::new());
        let mut backend = FakeBackend::new(cache.clone());
        backend.fail_login = true;
        let session = session_with(backend, cache);

        let err = session.login("user1", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Bad credentials");
        assert!(!session.is_authenticated());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn logout_clears_cache_keys_even_if_backend_fails() {
        let cache = Arc::new(MemoryCache::new());
        let mut backend = FakeBackend::new(cache.clone());
        backend.fail_logout = true;
        let session = session_with(backend, cache.clone());

        session.login("user1", "pw").await.unwrap();
        session.logout().await;

        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
        for key in [keys::CACHED_USER, keys::AUTH_TOKEN, keys::USER_ID] {
            assert_eq!(cache.get_item(key).unwrap(), None, "{key} should be cleared");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn restore_uses_cache_then_revalidates() {
        let cache = Arc::new(MemoryCache::new());
        cache.set_item(keys::AUTH_TOKEN, "token-1").unwrap();
        cache.set_json(keys::CACHED_USER, &user(1)).unwrap();

        let backend = FakeBackend::new(cache.clone());
        backend.token_valid.store(false, Ordering::SeqCst);
        let session = session_with(backend, cache.clone());

        let handle = session.restore().await.expect("revalidation should be scheduled");
        assert!(session.is_authenticated());
        assert!(!session.is_loading());

        tokio::time::advance(Duration::from_millis(1_001)).await;
        handle.await.unwrap();

        assert!(!session.is_authenticated());
        assert_eq!(cache.get_item(keys::CACHED_USER).unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn revalidation_errors_keep_the_session() {
        let cache = Arc::new(MemoryCache::new());
        cache.set_item(keys::AUTH_TOKEN, "token-1").unwrap();
        cache.set_json(keys::CACHED_USER, &user(1)).unwrap();

        let mut backend = FakeBackend::new(cache.clone());
        backend.verify_errors = true;
        let session = session_with(backend, cache);

        let handle = session.restore().await.unwrap();
        tokio::time::advance(Duration::from_millis(1_001)).await;
        handle.await.unwrap();

        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn restore_without_cache_asks_backend() {
        let cache = Arc::new(MemoryCache::new());
        cache.set_item(keys::AUTH_TOKEN, "token-1").unwrap();
        let session = session_with(FakeBackend::new(cache.clone()), cache.clone());

        assert!(session.restore().await.is_none());
        assert!(session.is_authenticated());
        assert!(cache.get_item(keys::CACHED_USER).unwrap().is_some());
    }

    #[tokio::test]
    async fn restore_with_nothing_stays_signed_out() {
        let cache = Arc::new(MemoryCache::new());
        let session = session_with(FakeBackend::new(cache.clone()), cache);

        assert!(session.is_loading());
        assert!(session.restore().await.is_none());
        assert!(!session.is_authenticated());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn restore_failure_logs_out() {
        let cache = Arc::new(MemoryCache::new());
        cache.set_item(keys::AUTH_TOKEN, "token-1").unwrap();
        let mut backend = FakeBackend::new(cache.clone());
        backend.verify_errors = true;
        let backend = Arc::new(backend);
        let session = Arc::new(AuthSession::new(
            backend.clone(),
            cache.clone(),
            Duration::from_millis(1_000),
        ));

        assert!(session.restore().await.is_none());
        assert!(!session.is_authenticated());
        assert_eq!(backend.logouts.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get_item(keys::AUTH_TOKEN).unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_cached_user_falls_back_to_backend() {
        let cache = Arc::new(MemoryCache::new());
        cache.set_item(keys::AUTH_TOKEN, "token-1").unwrap();
        cache.set_item(keys::CACHED_USER, "{oops").unwrap();
        let session = session_with(FakeBackend::new(cache.clone()), cache);

        assert!(session.restore().await.is_none());
        assert_eq!(session.user().map(|u| u.id), Some(1));
    }

    #[tokio::test]
    async fn status_update_mirrors_into_cache() {
        let cache = Arc::new(MemoryCache::new());
        let session = session_with(FakeBackend::new(cache.clone()), cache.clone());
        session.login("user1", "pw").await.unwrap();

        session
            .update_user_status(UserStatus::Away, Some(false))
            .await
            .unwrap();

        let user = session.user().unwrap();
        assert_eq!(user.status, UserStatus::Away);
        assert!(!user.is_online);
        let cached: User = cache.get_json(keys::CACHED_USER).unwrap().unwrap();
        assert_eq!(cached.status, UserStatus::Away);
    }

    #[tokio::test]
    async fn bypass_signs_in() {
        let cache = Arc::new(MemoryCache::new());
        let session = session_with(FakeBackend::new(cache.clone()), cache);
        let mut rx = session.subscribe();

        session.bypass_auth().await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated);
    }
}
