//! Handlers for coach invitations, assignments and client views.
//!
//! The plaintext invitation token never appears in a response; it reaches
//! the invitee only through the invitation email.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use fitup_core::types::{DbId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireCoach};
use crate::query::{IncludeInactiveParams, PaginationParams};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InviteBody {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct AcceptBody {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ExpirySweep {
    pub expired: u64,
}

/* --------------------------------------------------------------------------
Invitations
-------------------------------------------------------------------------- */

/// POST /coach/invitations
pub async fn create_invitation(
    RequireCoach(coach): RequireCoach,
    State(state): State<AppState>,
    Json(body): Json<InviteBody>,
) -> AppResult<impl IntoResponse> {
    let issued = state
        .services
        .coaching
        .create_invitation(&coach.actor(), &body.email)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(issued.invitation))))
}

/// GET /coach/invitations
pub async fn list_invitations(
    RequireCoach(coach): RequireCoach,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let invitations = state.services.coaching.list_invitations(&coach.actor()).await?;
    Ok(Json(DataResponse::new(invitations)))
}

/// POST /coach/invitations/{id}/resend
///
/// Rotates the token and restarts the expiry window.
pub async fn resend_invitation(
    RequireCoach(coach): RequireCoach,
    State(state): State<AppState>,
    Path(invitation_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let issued = state
        .services
        .coaching
        .resend_invitation(&coach.actor(), invitation_id)
        .await?;
    Ok(Json(DataResponse::new(issued.invitation)))
}

/// DELETE /coach/invitations/{id}
pub async fn cancel_invitation(
    RequireCoach(coach): RequireCoach,
    State(state): State<AppState>,
    Path(invitation_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let invitation = state
        .services
        .coaching
        .cancel_invitation(&coach.actor(), invitation_id)
        .await?;
    Ok(Json(DataResponse::new(invitation)))
}

/// POST /invitations/accept
///
/// Any authenticated user whose token email matches the invitation.
pub async fn accept_invitation(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<AcceptBody>,
) -> AppResult<impl IntoResponse> {
    let accepted = state
        .services
        .coaching
        .accept_invitation(&auth.actor(), &body.token)
        .await?;
    Ok(Json(DataResponse::new(accepted)))
}

/// POST /admin/invitations/expire
///
/// Run the expiry sweep now instead of waiting for the hourly job.
pub async fn expire_invitations(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let expired = state.services.coaching.expire_invitations(Utc::now()).await?;
    tracing::info!(admin = %admin.user_id, expired, "Manual invitation expiry sweep");
    Ok(Json(DataResponse::new(ExpirySweep { expired })))
}

/* --------------------------------------------------------------------------
Clients
-------------------------------------------------------------------------- */

/// GET /coach/clients
pub async fn list_clients(
    RequireCoach(coach): RequireCoach,
    State(state): State<AppState>,
    Query(params): Query<IncludeInactiveParams>,
) -> AppResult<impl IntoResponse> {
    let clients = state
        .services
        .coaching
        .list_clients(&coach.actor(), !params.include_inactive)
        .await?;
    Ok(Json(DataResponse::new(clients)))
}

/// GET /coach/clients/{user_id}/sessions
pub async fn client_sessions(
    RequireCoach(coach): RequireCoach,
    State(state): State<AppState>,
    Path(client_id): Path<UserId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let sessions = state
        .services
        .coaching
        .client_sessions(&coach.actor(), &client_id, params.limit, params.offset)
        .await?;
    Ok(Json(DataResponse::new(sessions)))
}

/// DELETE /coach/assignments/{id}
///
/// Either side of the assignment (or an admin) may end it.
pub async fn deactivate_assignment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(assignment_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let assignment = state
        .services
        .coaching
        .deactivate_assignment(&auth.actor(), assignment_id)
        .await?;
    Ok(Json(DataResponse::new(assignment)))
}
