pub mod analytics;
pub mod coach;
pub mod goals;
pub mod health;
pub mod messages;
pub mod plans;
pub mod profile;
pub mod sessions;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                    WebSocket (token via header or ?token=)
///
/// /plans/...                             plan generation, tracking, export
/// /workout-sessions/...                  session lifecycle and stats
/// /analytics/...                         1RM, strength, plateau, volume, load
/// /goals/...                             goal CRUD and progress
/// /profile, /exercises                   workout profile, exercise catalog
/// /coach/..., /invitations/accept        invitations, assignments, clients
/// /admin/invitations/expire              manual expiry sweep (admin only)
/// /messages/...                          conversations and messages
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/plans", plans::router())
        .nest("/workout-sessions", sessions::router())
        .nest("/analytics", analytics::router())
        .nest("/goals", goals::router())
        .nest("/messages", messages::router())
        .merge(profile::router())
        .merge(coach::router())
}
