//! Route definitions for workout plans.
//!
//! Registered under `/plans`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::plans;
use crate::state::AppState;

/// Plan routes, registered as `/plans`.
///
/// ```text
/// POST   /generate                          generate_plan
/// GET    /active/{user_id}                  get_active_plan
/// GET    /active/{user_id}/schedule         get_active_schedule
/// GET    /history/{user_id}                 get_history
/// GET    /adaptations/{user_id}             list_user_adaptations
/// POST   /{plan_id}/performance             track_performance
/// GET    /{plan_id}/effectiveness           get_effectiveness
/// POST   /{plan_id}/mark-regeneration       mark_for_regeneration
/// POST   /{plan_id}/regenerate              regenerate_plan
/// GET    /{plan_id}/adaptations             list_plan_adaptations
/// POST   /{plan_id}/adaptations             log_adaptation
/// GET    /{plan_id}/download                download_plan (application/pdf)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(plans::generate_plan))
        .route("/active/{user_id}", get(plans::get_active_plan))
        .route("/active/{user_id}/schedule", get(plans::get_active_schedule))
        .route("/history/{user_id}", get(plans::get_history))
        .route("/adaptations/{user_id}", get(plans::list_user_adaptations))
        .route("/{plan_id}/performance", post(plans::track_performance))
        .route("/{plan_id}/effectiveness", get(plans::get_effectiveness))
        .route("/{plan_id}/mark-regeneration", post(plans::mark_for_regeneration))
        .route("/{plan_id}/regenerate", post(plans::regenerate_plan))
        .route(
            "/{plan_id}/adaptations",
            get(plans::list_plan_adaptations).post(plans::log_adaptation),
        )
        .route("/{plan_id}/download", get(plans::download_plan))
}
