//! Handlers for workout profiles and the exercise catalog.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use fitup_core::types::DbId;
use fitup_db::models::exercise::ExerciseFilter;
use fitup_db::models::profile::UpsertProfile;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::UserScope;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /profile
pub async fn get_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(scope): Query<UserScope>,
) -> AppResult<impl IntoResponse> {
    let user_id = scope.resolve(&auth);
    let profile = state.services.profiles.get(&auth.actor(), &user_id).await?;
    Ok(Json(DataResponse::new(profile)))
}

/// PUT /profile
pub async fn upsert_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(scope): Query<UserScope>,
    Json(input): Json<UpsertProfile>,
) -> AppResult<impl IntoResponse> {
    let user_id = scope.resolve(&auth);
    let profile = state.services.profiles.upsert(&auth.actor(), &user_id, input).await?;
    Ok(Json(DataResponse::new(profile)))
}

/// GET /exercises
///
/// Catalog listing; every filter is optional and they combine with AND.
pub async fn list_exercises(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<ExerciseFilter>,
) -> AppResult<impl IntoResponse> {
    let exercises = state.services.profiles.list_exercises(&filter).await?;
    Ok(Json(DataResponse::new(exercises)))
}

/// GET /exercises/{id}
pub async fn get_exercise(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(exercise_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let exercise = state.services.profiles.get_exercise(exercise_id).await?;
    Ok(Json(DataResponse::new(exercise)))
}
