//! Shared helpers for tests.

use axum_test::TestServer;
use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::{
    build_router,
    config::{Config, OAuthConfig},
    db::{handlers::Sessions, models::sessions::SessionCreateDBRequest},
    storage::create_blob_storage,
    AppState,
};

/// Identity present on the test allow list.
pub const ALLOWED_IDENTITY: &str = "allowed-identity";

pub fn create_test_config() -> Config {
    Config {
        public_url: Some("http://localhost".to_string()),
        auth: crate::config::AuthConfig {
            oauth: OAuthConfig {
                client_id: Some("test-client".to_string()),
                allowed_identities: vec![ALLOWED_IDENTITY.to_string()],
                ..Default::default()
            },
        },
        ..Default::default()
    }
}

pub async fn create_test_state(pool: SqlitePool, config: Config) -> (AppState, TempDir) {
    let tempdir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut config = config;
    config.storage.path = tempdir.path().to_path_buf();

    let storage = create_blob_storage(tempdir.path()).await.expect("Failed to create blob storage");
    let state = AppState {
        db: pool,
        config,
        storage,
        http: reqwest::Client::new(),
    };
    (state, tempdir)
}

/// Spin up a `TestServer` over the full router. The returned `TempDir`
/// backs blob storage and must outlive the server.
pub async fn create_test_app(pool: SqlitePool) -> (TestServer, TempDir) {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: SqlitePool, config: Config) -> (TestServer, TempDir) {
    let (state, tempdir) = create_test_state(pool, config).await;
    let router = build_router(state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to create test server");
    (server, tempdir)
}

/// Insert a session for the given identity and return its id, ready to go
/// into a `session` cookie.
pub async fn create_session(pool: &SqlitePool, identity_id: &str) -> String {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let session = Sessions::new(&mut conn)
        .create(&SessionCreateDBRequest {
            identity_id: identity_id.to_string(),
            handle: Some("owner".to_string()),
            access_token: "test-token".to_string(),
        })
        .await
        .expect("Failed to create session");
    session.id
}
