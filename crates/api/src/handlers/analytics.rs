//! Handlers for training analytics.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use fitup_core::types::{DbId, UserId};
use fitup_core::week::week_start;
use fitup_services::analytics::OneRepMaxRequest;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TimeframeParams {
    /// Window in days.
    pub timeframe: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct WeekParams {
    pub week_start: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DaysParams {
    pub days: Option<i64>,
}

/// POST /analytics/one-rep-max
///
/// Estimate a 1RM; with `store: true` it is persisted through the sanity gate.
pub async fn estimate_one_rep_max(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<OneRepMaxRequest>,
) -> AppResult<impl IntoResponse> {
    let result = state
        .services
        .analytics
        .estimate_one_rep_max(&auth.actor(), request)
        .await?;
    Ok(Json(DataResponse::new(result)))
}

/// GET /analytics/strength/{user_id}/exercise/{exercise_id}?timeframe=N
pub async fn strength_progression(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((user_id, exercise_id)): Path<(UserId, DbId)>,
    Query(params): Query<TimeframeParams>,
) -> AppResult<impl IntoResponse> {
    let progression = state
        .services
        .analytics
        .strength_progression(&auth.actor(), &user_id, exercise_id, params.timeframe)
        .await?;
    Ok(Json(DataResponse::new(progression)))
}

/// GET /analytics/plateau/{user_id}/exercise/{exercise_id}
pub async fn plateau(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((user_id, exercise_id)): Path<(UserId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let analysis = state
        .services
        .analytics
        .plateau(&auth.actor(), &user_id, exercise_id)
        .await?;
    Ok(Json(DataResponse::new(analysis)))
}

/// GET /analytics/goals/{goal_id}/prediction
pub async fn goal_prediction(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(goal_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let prediction = state.services.analytics.goal_prediction(&auth.actor(), goal_id).await?;
    Ok(Json(DataResponse::new(prediction)))
}

/// GET /analytics/volume/{user_id}?week_start=YYYY-MM-DD
pub async fn weekly_volume(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(params): Query<WeekParams>,
) -> AppResult<impl IntoResponse> {
    let monday = params
        .week_start
        .unwrap_or_else(|| week_start(Utc::now().date_naive()));
    let volume = state
        .services
        .analytics
        .weekly_volume(&auth.actor(), &user_id, monday)
        .await?;
    Ok(Json(DataResponse::new(volume)))
}

/// GET /analytics/intensity/{user_id}?days=N
pub async fn intensity(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(params): Query<DaysParams>,
) -> AppResult<impl IntoResponse> {
    let analysis = state
        .services
        .analytics
        .intensity(&auth.actor(), &user_id, params.days)
        .await?;
    Ok(Json(DataResponse::new(analysis)))
}

/// GET /analytics/optimal-load/{user_id}
pub async fn optimal_load(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> AppResult<impl IntoResponse> {
    let load = state.services.analytics.optimal_load(&auth.actor(), &user_id).await?;
    Ok(Json(DataResponse::new(load)))
}

/// GET /analytics/consistency/{user_id}
pub async fn consistency(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> AppResult<impl IntoResponse> {
    let report = state.services.analytics.consistency(&auth.actor(), &user_id).await?;
    Ok(Json(DataResponse::new(report)))
}
