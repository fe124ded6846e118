//! Route definitions for profiles and the exercise catalog.

use axum::routing::get;
use axum::Router;

use crate::handlers::profile;
use crate::state::AppState;

/// ```text
/// GET    /profile           get_profile
/// PUT    /profile           upsert_profile
/// GET    /exercises         list_exercises
/// GET    /exercises/{id}    get_exercise
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile::get_profile).put(profile::upsert_profile))
        .route("/exercises", get(profile::list_exercises))
        .route("/exercises/{id}", get(profile::get_exercise))
}
