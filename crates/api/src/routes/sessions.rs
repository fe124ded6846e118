//! Route definitions for workout sessions.
//!
//! Registered under `/workout-sessions`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

/// Session routes, registered as `/workout-sessions`.
///
/// ```text
/// POST   /start                 start_session
/// GET    /active                get_active_session
/// GET    /history               get_history
/// GET    /weekly                get_weekly_stats
/// POST   /{id}/log-exercise     log_exercise
/// POST   /{id}/complete         complete_session
/// POST   /{id}/skip             skip_workout (id is a workout id)
/// GET    /{id}/metrics          get_metrics
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(sessions::start_session))
        .route("/active", get(sessions::get_active_session))
        .route("/history", get(sessions::get_history))
        .route("/weekly", get(sessions::get_weekly_stats))
        .route("/{id}/log-exercise", post(sessions::log_exercise))
        .route("/{id}/complete", post(sessions::complete_session))
        .route("/{id}/skip", post(sessions::skip_workout))
        .route("/{id}/metrics", get(sessions::get_metrics))
}
