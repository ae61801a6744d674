/// Application name
pub const APP_NAME: &str = "DevSync";

/// Default REST base URL used when `DEVSYNC_API_URL` is not set
pub const DEFAULT_API_URL: &str = "http://10.132.169.243:8080/api";

/// Default HTTP request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Delay before a restored session is re-validated against the backend
pub const DEFAULT_REVALIDATE_DELAY_MS: u64 = 1_000;

/// Prefix of the tokens issued by the offline bypass login
pub const BYPASS_TOKEN_PREFIX: &str = "bypass-token-";

/// User id reported for the offline bypass login
pub const BYPASS_USER_ID: i64 = 999;

/// Default page size for paged message queries
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// REST calls slower than this are logged at `warn`
pub const SLOW_REQUEST_THRESHOLD_MS: u64 = 100;

/// Device cache keys
pub mod keys {
    /// JSON-encoded [`crate::User`] of the signed-in user
    pub const CACHED_USER: &str = "cachedUser";
    /// Bearer token returned by `/auth/signin`
    pub const AUTH_TOKEN: &str = "authToken";
    /// Numeric id of the signed-in user
    pub const USER_ID: &str = "userId";
    /// Legacy secure-store token key read by the realtime connection
    pub const USER_TOKEN: &str = "userToken";
    /// Legacy secure-store profile key
    pub const USER_DATA: &str = "userData";

    /// Keys removed when a session ends
    pub const SESSION_KEYS: [&str; 5] = [CACHED_USER, AUTH_TOKEN, USER_ID, USER_TOKEN, USER_DATA];
}
