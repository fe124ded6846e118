//! Route definitions for coaching: invitations, assignments, client views.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::coach;
use crate::state::AppState;

/// ```text
/// POST   /coach/invitations                 create_invitation (coach)
/// GET    /coach/invitations                 list_invitations (coach)
/// POST   /coach/invitations/{id}/resend     resend_invitation (coach)
/// DELETE /coach/invitations/{id}            cancel_invitation (coach)
/// GET    /coach/clients                     list_clients (coach)
/// GET    /coach/clients/{user_id}/sessions  client_sessions (coach)
/// DELETE /coach/assignments/{id}            deactivate_assignment
/// POST   /invitations/accept                accept_invitation
/// POST   /admin/invitations/expire          expire_invitations (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/coach/invitations",
            get(coach::list_invitations).post(coach::create_invitation),
        )
        .route("/coach/invitations/{id}/resend", post(coach::resend_invitation))
        .route("/coach/invitations/{id}", delete(coach::cancel_invitation))
        .route("/coach/clients", get(coach::list_clients))
        .route("/coach/clients/{user_id}/sessions", get(coach::client_sessions))
        .route("/coach/assignments/{id}", delete(coach::deactivate_assignment))
        .route("/invitations/accept", post(coach::accept_invitation))
        .route("/admin/invitations/expire", post(coach::expire_invitations))
}
