//! HTTP-level tests for bearer authentication and role enforcement.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, coach_token, get, get_auth, post_auth, test_config, token, user_token};
use fitup_api::auth::jwt::{generate_access_token, JwtConfig};
use fitup_core::roles::Role;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let (app, _state) = common::build_test_app();

    let response = get(&app, "/api/v1/goals").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let (app, _state) = common::build_test_app();

    let response = get_auth(&app, "/api/v1/goals", "not-a-jwt").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_another_secret_is_unauthorized() {
    let (app, _state) = common::build_test_app();
    let foreign = JwtConfig {
        secret: "a-completely-different-secret-of-32-chars".to_string(),
        ..test_config().jwt
    };
    let token = generate_access_token("mallory", Role::Admin, None, &foreign).unwrap();

    let response = get_auth(&app, "/api/v1/goals", &token).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_bearer_scheme_is_unauthorized() {
    let (app, _state) = common::build_test_app();
    let request = Request::builder()
        .uri("/api/v1/goals")
        .header("authorization", format!("Basic {}", user_token("alice")))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_reaches_handler() {
    let (app, _state) = common::build_test_app();

    let response = get_auth(&app, "/api/v1/goals", &user_token("alice")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"], serde_json::json!([]));
}

// ---------------------------------------------------------------------------
// Role enforcement
// ---------------------------------------------------------------------------

#[tokio::test]
async fn plain_user_cannot_use_coach_routes() {
    let (app, _state) = common::build_test_app();

    let response = get_auth(&app, "/api/v1/coach/clients", &user_token("alice")).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn coach_can_list_clients() {
    let (app, _state) = common::build_test_app();

    let response = get_auth(&app, "/api/v1/coach/clients", &coach_token("carol")).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn expiry_sweep_requires_admin() {
    let (app, _state) = common::build_test_app();

    let response = post_auth(&app, "/api/v1/admin/invitations/expire", &coach_token("carol")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = token("root", Role::Admin);
    let response = post_auth(&app, "/api/v1/admin/invitations/expire", &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["expired"], 0);
}
