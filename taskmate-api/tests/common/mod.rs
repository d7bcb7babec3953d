/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - Test user creation with a live session token
/// - API request/response helpers
///
/// The integration tests require a running PostgreSQL database plus the
/// usual environment (DATABASE_URL, JWT_SECRET, MAIL_API_KEY). They are
/// marked `#[ignore]` so `cargo test` stays green without infrastructure;
/// run them with `cargo test -- --ignored`.

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use sqlx::PgPool;
use taskmate_api::app::{build_router, AppState};
use taskmate_api::config::Config;
use taskmate_api::notify::Mailer;
use taskmate_shared::auth::password::hash_password;
use taskmate_shared::db::migrations::run_migrations;
use taskmate_shared::models::task::Task;
use taskmate_shared::models::user::{NewUser, User};
use uuid::Uuid;

/// Password used for every test account
pub const TEST_PASSWORD: &str = "horse-staple-7";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub user: User,
    pub token: String,
}

impl TestContext {
    /// Creates a new test context with a migrated database and one
    /// authenticated user
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;
        run_migrations(&db).await?;

        let user = create_test_user(&db).await?;
        let token = user.generate_auth_token(&db, &config.jwt.secret).await?;

        let mailer = Mailer::new(config.mail.api_key.clone(), config.mail.from.clone());
        let state = AppState::new(db.clone(), config, mailer);
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            user,
            token,
        })
    }

    /// Returns authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Deletes the test user's rows
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        Task::delete_all_owned(&self.db, self.user.id).await?;
        User::delete(&self.db, self.user.id).await?;
        Ok(())
    }
}

/// Creates a user row directly, bypassing the API
pub async fn create_test_user(db: &PgPool) -> anyhow::Result<User> {
    let user = User::create(
        db,
        NewUser {
            name: "Test User".to_string(),
            email: format!("test-{}@example.com", Uuid::new_v4()),
            age: 30,
            password_hash: hash_password(TEST_PASSWORD)?,
        },
    )
    .await?;

    Ok(user)
}

/// Builds an authenticated JSON request
pub fn json_request(
    ctx: &TestContext,
    method: &str,
    uri: &str,
    body: serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, ctx.auth_header())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Builds an authenticated request with no body
pub fn empty_request(ctx: &TestContext, method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, ctx.auth_header())
        .body(Body::empty())
        .unwrap()
}

/// Reads a response body as JSON, panicking with the body text on a
/// status mismatch
pub async fn read_json(response: Response<Body>, expected: StatusCode) -> serde_json::Value {
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    if status != expected {
        panic!(
            "Expected {}, got {}: {}",
            expected,
            status,
            String::from_utf8_lossy(&body)
        );
    }

    serde_json::from_slice(&body).unwrap()
}

/// Encodes a single-field multipart body the way a browser form would
pub fn multipart_body(
    boundary: &str,
    field: &str,
    filename: &str,
    content_type: &str,
    bytes: &[u8],
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
