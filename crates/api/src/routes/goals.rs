//! Route definitions for fitness goals.
//!
//! Registered under `/goals`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::goals;
use crate::state::AppState;

/// ```text
/// GET    /                  list_goals
/// POST   /                  create_goal
/// PUT    /{id}/progress     update_progress
/// POST   /{id}/complete     complete_goal
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(goals::list_goals).post(goals::create_goal))
        .route("/{id}/progress", put(goals::update_progress))
        .route("/{id}/complete", post(goals::complete_goal))
}
