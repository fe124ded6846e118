//! HTTP-level tests for the workout session lifecycle.

mod common;

use axum::http::StatusCode;
use common::{body_json, get_auth, plan_request, post_auth, post_json_auth, user_token};

/// Generate a plan for `user_id` and return its schedule JSON.
async fn planned_schedule(app: &axum::Router, user_id: &str) -> serde_json::Value {
    let token = user_token(user_id);
    let response = post_json_auth(app, "/api/v1/plans/generate", &token, plan_request()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get_auth(app, &format!("/api/v1/plans/active/{user_id}/schedule"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Test: start, log, complete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_session_lifecycle() {
    let (app, _state) = common::build_test_app();
    let token = user_token("alice");
    let schedule = planned_schedule(&app, "alice").await;
    let workout = &schedule["workouts"][0];
    let exercise = &workout["exercises"][0];

    let response = post_json_auth(
        &app,
        "/api/v1/workout-sessions/start",
        &token,
        serde_json::json!({ "workout_id": workout["id"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let session = body_json(response).await["data"].clone();
    assert_eq!(session["status"], "active");
    let session_id = session["id"].as_i64().unwrap();

    let response = get_auth(&app, "/api/v1/workout-sessions/active", &token).await;
    assert_eq!(body_json(response).await["data"]["id"], session_id);

    let sets: Vec<_> = (0..exercise["sets"].as_i64().unwrap())
        .map(|_| serde_json::json!({ "weight": 20.0, "reps": 8, "rpe": 7.5 }))
        .collect();
    let response = post_json_auth(
        &app,
        &format!("/api/v1/workout-sessions/{session_id}/log-exercise"),
        &token,
        serde_json::json!({ "exercise_id": exercise["exercise_id"], "sets": sets }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_auth(&app, &format!("/api/v1/workout-sessions/{session_id}/complete"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let completed = body_json(response).await["data"].clone();
    assert_eq!(completed["session"]["status"], "completed");
    assert_eq!(completed["metrics"]["total_sets"], exercise["sets"]);

    let response = get_auth(&app, "/api/v1/workout-sessions/active", &token).await;
    assert_eq!(body_json(response).await["data"], serde_json::Value::Null);

    let response = get_auth(&app, &format!("/api/v1/workout-sessions/{session_id}/metrics"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(&app, "/api/v1/workout-sessions/history", &token).await;
    let history = body_json(response).await;
    assert_eq!(history["data"][0]["id"], session_id);
}

#[tokio::test]
async fn second_open_session_conflicts() {
    let (app, _state) = common::build_test_app();
    let token = user_token("alice");

    let response = post_auth(&app, "/api/v1/workout-sessions/start", &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_auth(&app, "/api/v1/workout-sessions/start", &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn other_user_cannot_complete_session() {
    let (app, _state) = common::build_test_app();

    let response = post_auth(&app, "/api/v1/workout-sessions/start", &user_token("alice")).await;
    let session_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_auth(
        &app,
        &format!("/api/v1/workout-sessions/{session_id}/complete"),
        &user_token("bob"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Test: skipping a scheduled workout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn skip_records_a_skipped_session() {
    let (app, _state) = common::build_test_app();
    let token = user_token("alice");
    let schedule = planned_schedule(&app, "alice").await;
    let workout_id = schedule["workouts"][0]["id"].as_i64().unwrap();

    let response = post_json_auth(
        &app,
        &format!("/api/v1/workout-sessions/{workout_id}/skip"),
        &token,
        serde_json::json!({ "reason": "travelling" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let skipped = body_json(response).await["data"].clone();
    assert_eq!(skipped["session"]["status"], "skipped");
    assert_eq!(skipped["skips_in_window"], 1);
}

#[tokio::test]
async fn skip_without_reason_is_rejected() {
    let (app, _state) = common::build_test_app();
    let schedule = planned_schedule(&app, "alice").await;
    let workout_id = schedule["workouts"][0]["id"].as_i64().unwrap();

    let response = post_json_auth(
        &app,
        &format!("/api/v1/workout-sessions/{workout_id}/skip"),
        &user_token("alice"),
        serde_json::json!({ "reason": "" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn weekly_stats_default_to_current_week() {
    let (app, _state) = common::build_test_app();

    let response = get_auth(&app, "/api/v1/workout-sessions/weekly", &user_token("alice")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["completed"], 0);
}
