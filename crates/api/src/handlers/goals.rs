//! Handlers for fitness goals.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use fitup_core::types::{DbId, UserId};
use fitup_db::models::goal::NewGoal;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::UserScope;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListGoalsParams {
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProgressBody {
    pub current_value: f64,
}

/// POST /goals
pub async fn create_goal(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(scope): Query<UserScope>,
    Json(mut input): Json<NewGoal>,
) -> AppResult<impl IntoResponse> {
    input.user_id = scope.resolve(&auth);
    let goal = state.services.goals.create(&auth.actor(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(goal))))
}

/// GET /goals
pub async fn list_goals(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListGoalsParams>,
) -> AppResult<impl IntoResponse> {
    let user_id = params.user_id.unwrap_or_else(|| auth.user_id.clone());
    let goals = state
        .services
        .goals
        .list(&auth.actor(), &user_id, params.active_only)
        .await?;
    Ok(Json(DataResponse::new(goals)))
}

/// PUT /goals/{id}/progress
pub async fn update_progress(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(goal_id): Path<DbId>,
    Json(body): Json<ProgressBody>,
) -> AppResult<impl IntoResponse> {
    let goal = state
        .services
        .goals
        .update_progress(&auth.actor(), goal_id, body.current_value)
        .await?;
    Ok(Json(DataResponse::new(goal)))
}

/// POST /goals/{id}/complete
pub async fn complete_goal(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(goal_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let goal = state.services.goals.complete(&auth.actor(), goal_id).await?;
    Ok(Json(DataResponse::new(goal)))
}
