//! Handlers for workout plans: generation, history, performance tracking,
//! regeneration, adaptations and PDF export.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use fitup_core::plan::effectiveness::PerformanceSample;
use fitup_core::plan::metadata::PlanRequest;
use fitup_core::types::{DbId, UserId};
use fitup_services::plans::AdaptationLog;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::{LimitParams, UserScope};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReasonBody {
    #[serde(default)]
    pub reason: String,
}

/// POST /plans/generate
///
/// Generate and persist a plan for the caller (or `?user_id=` for an
/// assigned coach).
pub async fn generate_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(scope): Query<UserScope>,
    Json(request): Json<PlanRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = scope.resolve(&auth);
    let plan = state.services.plans.create_plan(&auth.actor(), &user_id, request).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(plan))))
}

/// GET /plans/active/{user_id}
pub async fn get_active_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> AppResult<impl IntoResponse> {
    let plan = state.services.plans.get_active_plan(&auth.actor(), &user_id).await?;
    Ok(Json(DataResponse::new(plan)))
}

/// GET /plans/active/{user_id}/schedule
///
/// The active weekly schema with its workouts and prescriptions.
pub async fn get_active_schedule(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> AppResult<impl IntoResponse> {
    let schedule = state.services.plans.active_schedule(&auth.actor(), &user_id).await?;
    Ok(Json(DataResponse::new(schedule)))
}

/// GET /plans/history/{user_id}
pub async fn get_history(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(params): Query<LimitParams>,
) -> AppResult<impl IntoResponse> {
    let plans = state.services.plans.history(&auth.actor(), &user_id, params.limit).await?;
    Ok(Json(DataResponse::new(plans)))
}

/// POST /plans/{plan_id}/performance
pub async fn track_performance(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(plan_id): Path<DbId>,
    Json(sample): Json<PerformanceSample>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .services
        .plans
        .track_performance(&auth.actor(), plan_id, sample)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(record))))
}

/// GET /plans/{plan_id}/effectiveness
pub async fn get_effectiveness(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(plan_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let effectiveness = state.services.plans.effectiveness(&auth.actor(), plan_id).await?;
    Ok(Json(DataResponse::new(effectiveness)))
}

/// POST /plans/{plan_id}/mark-regeneration
///
/// Flag the plan so the next generation request replaces it.
pub async fn mark_for_regeneration(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(plan_id): Path<DbId>,
    Json(body): Json<ReasonBody>,
) -> AppResult<impl IntoResponse> {
    let plan = state
        .services
        .plans
        .mark_for_regeneration(&auth.actor(), plan_id, &body.reason)
        .await?;
    Ok(Json(DataResponse::new(plan)))
}

/// POST /plans/{plan_id}/regenerate
pub async fn regenerate_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(plan_id): Path<DbId>,
    Json(body): Json<ReasonBody>,
) -> AppResult<impl IntoResponse> {
    let plan = state
        .services
        .plans
        .regenerate(&auth.actor(), plan_id, &body.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(plan))))
}

/// GET /plans/{plan_id}/adaptations
pub async fn list_plan_adaptations(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(plan_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let adaptations = state.services.plans.adaptations(&auth.actor(), plan_id).await?;
    Ok(Json(DataResponse::new(adaptations)))
}

/// POST /plans/{plan_id}/adaptations
///
/// Record a manual adaptation against the plan.
pub async fn log_adaptation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(plan_id): Path<DbId>,
    Json(log): Json<AdaptationLog>,
) -> AppResult<impl IntoResponse> {
    let adaptation = state.services.plans.log_adaptation(&auth.actor(), plan_id, log).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(adaptation))))
}

/// GET /plans/adaptations/{user_id}
pub async fn list_user_adaptations(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(params): Query<LimitParams>,
) -> AppResult<impl IntoResponse> {
    let adaptations = state
        .services
        .plans
        .user_adaptations(&auth.actor(), &user_id, params.limit)
        .await?;
    Ok(Json(DataResponse::new(adaptations)))
}

/// GET /plans/{plan_id}/download
///
/// The plan rendered as a PDF attachment.
pub async fn download_plan(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(plan_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let bytes = state.services.plans.export_pdf(&auth.actor(), plan_id).await?;
    let disposition = format!("attachment; filename=\"fitup-plan-{plan_id}.pdf\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
