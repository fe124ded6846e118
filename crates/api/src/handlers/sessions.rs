//! Handlers for workout sessions.
//!
//! `POST /workout-sessions/{id}/skip` takes a *workout* id: a skip is
//! recorded without a session ever being started.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{NaiveDate, Utc};
use fitup_core::session::{SessionSummary, SetRecord};
use fitup_core::types::{DbId, Timestamp, UserId};
use fitup_core::week::week_start;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::UserScope;
use crate::response::DataResponse;
use crate::state::AppState;

/* --------------------------------------------------------------------------
Request types
-------------------------------------------------------------------------- */

#[derive(Debug, Default, Deserialize)]
pub struct StartSessionBody {
    #[serde(default)]
    pub workout_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct LogExerciseBody {
    pub exercise_id: DbId,
    pub sets: Vec<SetRecord>,
}

#[derive(Debug, Deserialize)]
pub struct SkipBody {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub user_id: Option<UserId>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct WeeklyParams {
    pub user_id: Option<UserId>,
    /// Monday of the week; defaults to the current week.
    pub week_start: Option<NaiveDate>,
}

/* --------------------------------------------------------------------------
Lifecycle
-------------------------------------------------------------------------- */

/// POST /workout-sessions/start
pub async fn start_session(
    auth: AuthUser,
    State(state): State<AppState>,
    body: Option<Json<StartSessionBody>>,
) -> AppResult<impl IntoResponse> {
    let workout_id = body.and_then(|Json(b)| b.workout_id);
    let session = state.services.sessions.start_session(&auth.actor(), workout_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(session))))
}

/// POST /workout-sessions/{id}/log-exercise
pub async fn log_exercise(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
    Json(body): Json<LogExerciseBody>,
) -> AppResult<impl IntoResponse> {
    let performance = state
        .services
        .sessions
        .log_exercise(&auth.actor(), session_id, body.exercise_id, body.sets)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(performance))))
}

/// POST /workout-sessions/{id}/complete
///
/// The summary body is optional.
pub async fn complete_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
    body: Option<Json<SessionSummary>>,
) -> AppResult<impl IntoResponse> {
    let summary = body.map(|Json(s)| s).unwrap_or_default();
    let completed = state
        .services
        .sessions
        .complete_session(&auth.actor(), session_id, summary)
        .await?;
    Ok(Json(DataResponse::new(completed)))
}

/// POST /workout-sessions/{id}/skip
pub async fn skip_workout(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(workout_id): Path<DbId>,
    Json(body): Json<SkipBody>,
) -> AppResult<impl IntoResponse> {
    let skipped = state
        .services
        .sessions
        .skip_workout(&auth.actor(), workout_id, &body.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(skipped))))
}

/* --------------------------------------------------------------------------
Reads
-------------------------------------------------------------------------- */

/// GET /workout-sessions/active
///
/// `data` is `null` when nothing is open.
pub async fn get_active_session(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let session = state.services.sessions.get_active_session(&auth.actor()).await?;
    Ok(Json(DataResponse::new(session)))
}

/// GET /workout-sessions/history
pub async fn get_history(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> AppResult<impl IntoResponse> {
    let user_id = UserScope {
        user_id: params.user_id,
    }
    .resolve(&auth);
    let sessions = state
        .services
        .sessions
        .history(&auth.actor(), &user_id, params.from, params.to, params.limit, params.offset)
        .await?;
    Ok(Json(DataResponse::new(sessions)))
}

/// GET /workout-sessions/{id}/metrics
pub async fn get_metrics(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let metrics = state.services.sessions.metrics(&auth.actor(), session_id).await?;
    Ok(Json(DataResponse::new(metrics)))
}

/// GET /workout-sessions/weekly
pub async fn get_weekly_stats(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<WeeklyParams>,
) -> AppResult<impl IntoResponse> {
    let user_id = UserScope {
        user_id: params.user_id,
    }
    .resolve(&auth);
    let monday = params
        .week_start
        .unwrap_or_else(|| week_start(Utc::now().date_naive()));
    let stats = state
        .services
        .sessions
        .weekly_stats(&auth.actor(), &user_id, monday)
        .await?;
    Ok(Json(DataResponse::new(stats)))
}
