//! REST client behaviour against a mock backend.

use std::sync::Arc;
use std::time::Duration;

use devsync_client::{ApiClient, AuthSession, ClientConfig, ClientError};
use devsync_shared::constants::keys;
use devsync_shared::rest::{Workspace, WorkspaceChannel};
use devsync_shared::{MessageKind, UserStatus};
use devsync_store::{DeviceCache, MemoryCache};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, Arc<MemoryCache>, ApiClient) {
    let server = MockServer::start().await;
    let cache = Arc::new(MemoryCache::new());
    let config = ClientConfig::for_api_url(format!("{}/api", server.uri()));
    let api = ApiClient::new(&config, cache.clone()).unwrap();
    (server, cache, api)
}

fn auth_body() -> serde_json::Value {
    json!({
        "token": "jwt-abc",
        "type": "Bearer",
        "id": 7,
        "username": "mike",
        "email": "mike@devsync.com",
        "roles": ["ROLE_USER"]
    })
}

fn profile_body() -> serde_json::Value {
    json!({
        "id": 7,
        "username": "mike",
        "email": "mike@devsync.com",
        "firstName": "Mike",
        "status": "ACTIVE",
        "isOnline": true,
        "lastSeen": "2025-01-02T09:41:07.123",
        "createdAt": "2025-01-01T00:00:00",
        "updatedAt": "2025-01-02T00:00:00"
    })
}

#[tokio::test]
async fn signin_stores_token_and_user_id() {
    let (server, cache, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signin"))
        .and(body_json(json!({ "username": "mike", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body()))
        .expect(1)
        .mount(&server)
        .await;

    let auth = api.login("mike", "pw").await.unwrap();

    assert_eq!(auth.id, 7);
    assert_eq!(cache.get_item(keys::AUTH_TOKEN).unwrap().as_deref(), Some("jwt-abc"));
    assert_eq!(api.current_user_id().unwrap(), Some(7));
}

#[tokio::test]
async fn error_body_message_becomes_the_error() {
    let (server, cache, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signin"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })))
        .mount(&server)
        .await;

    let err = api.login("mike", "wrong").await.unwrap_err();

    assert_eq!(err.to_string(), "Bad credentials");
    assert_eq!(err.status(), Some(401));
    assert!(cache.get_item(keys::AUTH_TOKEN).unwrap().is_none());
}

#[tokio::test]
async fn error_without_body_uses_status_code() {
    let (server, _, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/channels"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = api.user_channels().await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 503, .. }));
    assert_eq!(err.to_string(), "HTTP 503");
}

#[tokio::test]
async fn authed_requests_carry_the_bearer_token() {
    let (server, cache, api) = setup().await;
    cache.set_item(keys::AUTH_TOKEN, "jwt-abc").unwrap();
    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .and(header("Authorization", "Bearer jwt-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .mount(&server)
        .await;

    let user = api.user_profile().await.unwrap();
    assert_eq!(user.display_name(), "Mike");
    assert_eq!(user.created_at.to_rfc3339(), "2025-01-01T00:00:00+00:00");
}

#[tokio::test]
async fn logout_clears_credentials_even_on_server_error() {
    let (server, cache, api) = setup().await;
    cache.set_item(keys::AUTH_TOKEN, "jwt-abc").unwrap();
    cache.set_item(keys::USER_ID, "7").unwrap();
    Mock::given(method("POST"))
        .and(path("/api/auth/signout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    api.logout().await.unwrap();

    assert!(cache.get_item(keys::AUTH_TOKEN).unwrap().is_none());
    assert!(cache.get_item(keys::USER_ID).unwrap().is_none());
}

#[tokio::test]
async fn verify_decides_authentication() {
    let (server, cache, api) = setup().await;
    assert!(!api.is_authenticated().await.unwrap());

    cache.set_item(keys::AUTH_TOKEN, "jwt-abc").unwrap();
    Mock::given(method("GET"))
        .and(path("/api/auth/verify"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    assert!(!api.is_authenticated().await.unwrap());

    cache.set_item(keys::AUTH_TOKEN, "bypass-token-1").unwrap();
    assert!(api.is_authenticated().await.unwrap());
}

#[tokio::test]
async fn bypass_serves_a_fixed_profile_without_requests() {
    let (server, _, api) = setup().await;

    api.bypass_auth().await.unwrap();
    let user = api.user_profile().await.unwrap();

    assert_eq!(user.id, 999);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn status_update_uses_query_params() {
    let (server, _, api) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/api/users/status"))
        .and(query_param("status", "DO_NOT_DISTURB"))
        .and(query_param("isOnline", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = api
        .update_user_status(UserStatus::DoNotDisturb, Some(false))
        .await
        .unwrap();
    assert_eq!(resp.message, "ok");
}

#[tokio::test]
async fn messages_are_paged() {
    let (server, _, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/messages/channel/3"))
        .and(query_param("page", "0"))
        .and(query_param("size", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [],
            "totalElements": 0,
            "totalPages": 0,
            "last": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/messages/channel/3"))
        .and(body_json(json!({ "content": "hi", "type": "TEXT" })))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "down" })))
        .mount(&server)
        .await;

    let page = api.channel_messages(3, 0, None).await.unwrap();
    assert!(page.last);
    let err = api.send_channel_message(3, "hi", MessageKind::Text).await.unwrap_err();
    assert_eq!(err.to_string(), "down");
}

#[tokio::test]
async fn workspaces_fall_back_to_samples() {
    let (server, _, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/workspaces/user"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert_eq!(api.user_workspaces().await, Workspace::samples());
}

#[tokio::test]
async fn session_login_and_logout_round_trip() {
    let (server, cache, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let session = AuthSession::new(
        Arc::new(api),
        cache.clone(),
        std::time::Duration::from_millis(10),
    );

    session.login("mike", "pw").await.unwrap();
    assert_eq!(session.user().map(|u| u.username), Some("mike".to_string()));
    assert!(cache.get_item(keys::CACHED_USER).unwrap().is_some());

    session.logout().await;
    assert!(!session.is_authenticated());
    for key in [keys::CACHED_USER, keys::AUTH_TOKEN, keys::USER_ID] {
        assert!(cache.get_item(key).unwrap().is_none());
    }
}

fn channel_body(id: i64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "description": "Team chat",
        "isPrivate": true,
        "createdBy": profile_body(),
        "members": [],
        "createdAt": "2025-02-01T08:00:00",
        "updatedAt": "2025-02-01T08:00:00"
    })
}

fn workspace_body() -> serde_json::Value {
    json!({ "id": 42, "name": "Launch", "description": "Q3 launch", "memberCount": 1 })
}

#[tokio::test]
async fn forgot_and_reset_password_post_their_bodies() {
    let (server, _, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/forgot-password"))
        .and(body_json(json!({ "email": "mike@devsync.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "sent" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/reset-password"))
        .and(body_json(json!({ "token": "reset-1", "newPassword": "n3w" })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "message": "Token expired" })))
        .expect(1)
        .mount(&server)
        .await;

    api.forgot_password("mike@devsync.com").await.unwrap();
    let err = api.reset_password("reset-1", "n3w").await.unwrap_err();
    assert_eq!(err.to_string(), "Token expired");
}

#[tokio::test]
async fn refresh_replaces_the_stored_token() {
    let (server, cache, api) = setup().await;
    cache.set_item(keys::AUTH_TOKEN, "old-jwt").unwrap();
    let mut body = auth_body();
    body["token"] = json!("new-jwt");
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(header("Authorization", "Bearer old-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    api.refresh_token().await.unwrap();

    assert_eq!(cache.get_item(keys::AUTH_TOKEN).unwrap().as_deref(), Some("new-jwt"));
    assert_eq!(cache.get_item(keys::USER_ID).unwrap().as_deref(), Some("7"));
}

#[tokio::test]
async fn refresh_without_a_token_is_rejected_locally() {
    let (server, _, api) = setup().await;

    let err = api.refresh_token().await.unwrap_err();

    assert!(matches!(err, ClientError::NotAuthenticated));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn create_and_join_channel() {
    let (server, cache, api) = setup().await;
    cache.set_item(keys::AUTH_TOKEN, "jwt-abc").unwrap();
    Mock::given(method("POST"))
        .and(path("/api/channels"))
        .and(header("Authorization", "Bearer jwt-abc"))
        .and(body_json(json!({
            "name": "design",
            "description": "Team chat",
            "isPrivate": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(channel_body(11, "design")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/channels/11/join"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "joined" })))
        .expect(1)
        .mount(&server)
        .await;

    let channel = api.create_channel("design", "Team chat", true).await.unwrap();
    assert_eq!(channel.id, 11);
    assert!(channel.is_private);

    let resp = api.join_channel(channel.id).await.unwrap();
    assert_eq!(resp.message, "joined");
}

#[tokio::test]
async fn create_and_join_workspace() {
    let (server, _, api) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/workspaces"))
        .and(body_json(json!({ "name": "Launch", "description": "Q3 launch" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(workspace_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/workspaces/join"))
        .and(body_json(json!({ "inviteCode": "INV-42" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(workspace_body()))
        .expect(1)
        .mount(&server)
        .await;

    let created = api.create_workspace("Launch", "Q3 launch").await.unwrap();
    let joined = api.join_workspace("INV-42").await.unwrap();

    assert_eq!(created, joined);
    assert_eq!(created.member_count, 1);
}

#[tokio::test]
async fn workspace_channels_fall_back_to_samples() {
    let (server, _, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/workspaces/5/channels"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert_eq!(api.workspace_channels(5).await, WorkspaceChannel::samples());
}

#[tokio::test]
async fn firebase_token_goes_in_the_query() {
    let (server, cache, api) = setup().await;
    cache.set_item(keys::AUTH_TOKEN, "jwt-abc").unwrap();
    Mock::given(method("PUT"))
        .and(path("/api/users/firebase-token"))
        .and(query_param("token", "fcm:abc/123"))
        .and(header("Authorization", "Bearer jwt-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "saved" })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = api.update_firebase_token("fcm:abc/123").await.unwrap();
    assert_eq!(resp.message, "saved");
}

#[tokio::test]
async fn slow_responses_still_complete() {
    let (server, _, api) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/users/online"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([profile_body()]))
                .set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;

    let users = api.online_users().await.unwrap();
    assert_eq!(users.len(), 1);
}

#[test]
fn non_http_api_url_is_a_config_error() {
    let cache = Arc::new(MemoryCache::new());
    let config = ClientConfig::for_api_url("ftp://devsync.local/api");

    let err = ApiClient::new(&config, cache).err().unwrap();
    assert!(matches!(err, ClientError::Config(_)));
}
