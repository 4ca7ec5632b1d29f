//! Fixtures shared by the unit tests.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tower::ServiceExt;

use crate::config::Config;
use crate::mailer::MemoryMailer;
use crate::AppState;

pub const PASSWORD: &str = "correct horse battery";

/// Fresh in-memory database. One connection, or each would see its own db.
pub async fn pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

pub fn config() -> Config {
    Config::from_lookup(|name| match name {
        "DATABASE_URL" => Some("sqlite::memory:".to_string()),
        "SECRET_KEY" => Some("test-secret".to_string()),
        _ => None,
    })
    .unwrap()
}

pub async fn state(mailer: Arc<MemoryMailer>) -> AppState {
    AppState::new(pool().await, config(), mailer)
}

pub fn app(state: AppState) -> Router {
    crate::rest::router(state)
}

pub async fn insert_user(db: &SqlitePool, username: &str, is_active: bool) -> i64 {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(PASSWORD.as_bytes(), &salt)
        .unwrap()
        .to_string();
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (username, email, password_hash, is_active) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(username)
    .bind(format!("{}@example.com", username))
    .bind(password_hash)
    .bind(is_active)
    .fetch_one(db)
    .await
    .unwrap()
}

pub async fn insert_project(db: &SqlitePool, name: &str, details: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("INSERT INTO projects (name, details) VALUES (?, ?) RETURNING id")
        .bind(name)
        .bind(details)
        .fetch_one(db)
        .await
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Run one request through the router; the body is parsed as JSON when present.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<Value>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    if bytes.is_empty() {
        (status, None)
    } else {
        (status, Some(serde_json::from_slice(&bytes).unwrap()))
    }
}
