//! HTTP-level tests for plan generation, retrieval and export.

mod common;

use axum::http::StatusCode;
use common::{
    body_bytes, body_json, coach_token, get_auth, plan_request, post_json_auth, user_token,
};

/// Generate a plan for `user_id` and return its id.
async fn generate(app: &axum::Router, user_id: &str) -> i64 {
    let response = post_json_auth(app, "/api/v1/plans/generate", &user_token(user_id), plan_request()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["id"].as_i64().expect("plan id")
}

// ---------------------------------------------------------------------------
// Test: generation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_plan_returns_created_plan() {
    let (app, _state) = common::build_test_app();

    let response = post_json_auth(&app, "/api/v1/plans/generate", &user_token("alice"), plan_request()).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["user_id"], "alice");
    assert_eq!(json["data"]["active"], true);
}

#[tokio::test]
async fn second_generation_conflicts() {
    let (app, _state) = common::build_test_app();
    generate(&app, "alice").await;

    let response = post_json_auth(&app, "/api/v1/plans/generate", &user_token("alice"), plan_request()).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn zero_weekly_frequency_is_rejected() {
    let (app, _state) = common::build_test_app();
    let mut request = plan_request();
    request["weekly_frequency"] = serde_json::json!(0);

    let response = post_json_auth(&app, "/api/v1/plans/generate", &user_token("alice"), request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unassigned_coach_cannot_generate_for_user() {
    let (app, _state) = common::build_test_app();

    let response = post_json_auth(
        &app,
        "/api/v1/plans/generate?user_id=alice",
        &coach_token("carol"),
        plan_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Test: retrieval
// ---------------------------------------------------------------------------

#[tokio::test]
async fn active_plan_and_schedule_are_readable() {
    let (app, _state) = common::build_test_app();
    let plan_id = generate(&app, "alice").await;
    let token = user_token("alice");

    let response = get_auth(&app, "/api/v1/plans/active/alice", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], plan_id);

    let response = get_auth(&app, "/api/v1/plans/active/alice/schedule", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let workouts = json["data"]["workouts"].as_array().unwrap();
    assert_eq!(workouts.len(), 3);
    assert!(workouts.iter().all(|w| !w["exercises"].as_array().unwrap().is_empty()));
}

#[tokio::test]
async fn missing_active_plan_is_not_found() {
    let (app, _state) = common::build_test_app();

    let response = get_auth(&app, "/api/v1/plans/active/alice", &user_token("alice")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn other_users_plan_is_forbidden() {
    let (app, _state) = common::build_test_app();
    generate(&app, "alice").await;

    let response = get_auth(&app, "/api/v1/plans/active/alice", &user_token("bob")).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn history_lists_generated_plans() {
    let (app, _state) = common::build_test_app();
    let plan_id = generate(&app, "alice").await;

    let response = get_auth(&app, "/api/v1/plans/history/alice", &user_token("alice")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["id"], plan_id);
}

// ---------------------------------------------------------------------------
// Test: regeneration and export
// ---------------------------------------------------------------------------

#[tokio::test]
async fn regenerate_replaces_active_plan() {
    let (app, _state) = common::build_test_app();
    let plan_id = generate(&app, "alice").await;
    let token = user_token("alice");

    let response = post_json_auth(
        &app,
        &format!("/api/v1/plans/{plan_id}/regenerate"),
        &token,
        serde_json::json!({ "reason": "new gym" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let new_id = json["data"]["id"].as_i64().unwrap();
    assert_ne!(new_id, plan_id);

    let response = get_auth(&app, "/api/v1/plans/active/alice", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], new_id);
}

#[tokio::test]
async fn download_returns_pdf_attachment() {
    let (app, _state) = common::build_test_app();
    let plan_id = generate(&app, "alice").await;

    let response = get_auth(&app, &format!("/api/v1/plans/{plan_id}/download"), &user_token("alice")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/pdf");
    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.contains(&format!("fitup-plan-{plan_id}.pdf")));
    let bytes = body_bytes(response).await;
    assert!(bytes.starts_with(b"%PDF-1.4"));
}
