#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use fitup_api::auth::jwt::{generate_access_token, JwtConfig};
use fitup_api::config::{OAuthConfig, ServerConfig};
use fitup_api::router::build_app_router;
use fitup_api::state::AppState;
use fitup_core::roles::Role;
use fitup_db::MemoryRepository;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: String::new(),
        frontend_url: "http://localhost:5173".to_string(),
        request_timeout_secs: 30,
        shutdown_timeout_secs: 1,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        email: None,
        oauth: OAuthConfig::default(),
    }
}

/// The full application router over a fresh in-memory store, plus its state
/// so tests can reach the hub and event bus.
pub fn build_test_app() -> (Router, AppState) {
    let state = AppState::new(Arc::new(MemoryRepository::new()), test_config());
    let app = build_app_router(state.clone()).expect("test router builds");
    (app, state)
}

/// Access token for `user_id` with email `{user_id}@example.com`.
pub fn token(user_id: &str, role: Role) -> String {
    let email = format!("{user_id}@example.com");
    generate_access_token(user_id, role, Some(&email), &test_config().jwt).expect("token")
}

pub fn user_token(user_id: &str) -> String {
    token(user_id, Role::User)
}

pub fn coach_token(user_id: &str) -> String {
    token(user_id, Role::Coach)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json_auth(app: &Router, uri: &str, token: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn put_json_auth(app: &Router, uri: &str, token: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// A beginner, bodyweight-only, three-day general-fitness request.
pub fn plan_request() -> serde_json::Value {
    serde_json::json!({
        "goals": ["general_fitness"],
        "equipment": ["bodyweight"],
        "level": "beginner",
        "weekly_frequency": 3,
        "time_per_workout": 45
    })
}
