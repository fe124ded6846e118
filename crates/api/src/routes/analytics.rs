//! Route definitions for training analytics.
//!
//! Registered under `/analytics`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::analytics;
use crate::state::AppState;

/// Analytics routes, registered as `/analytics`.
///
/// ```text
/// POST   /one-rep-max                                   estimate_one_rep_max
/// GET    /strength/{user_id}/exercise/{exercise_id}     strength_progression
/// GET    /plateau/{user_id}/exercise/{exercise_id}      plateau
/// GET    /goals/{goal_id}/prediction                    goal_prediction
/// GET    /volume/{user_id}                              weekly_volume
/// GET    /intensity/{user_id}                           intensity
/// GET    /optimal-load/{user_id}                        optimal_load
/// GET    /consistency/{user_id}                         consistency
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/one-rep-max", post(analytics::estimate_one_rep_max))
        .route(
            "/strength/{user_id}/exercise/{exercise_id}",
            get(analytics::strength_progression),
        )
        .route("/plateau/{user_id}/exercise/{exercise_id}", get(analytics::plateau))
        .route("/goals/{goal_id}/prediction", get(analytics::goal_prediction))
        .route("/volume/{user_id}", get(analytics::weekly_volume))
        .route("/intensity/{user_id}", get(analytics::intensity))
        .route("/optimal-load/{user_id}", get(analytics::optimal_load))
        .route("/consistency/{user_id}", get(analytics::consistency))
}
