//! Coach assignments and invitations.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;
use fitup_core::invitation::InvitationStatus;
use fitup_core::types::{DbId, Timestamp, UserId};

/// A row from the `coach_assignments` table. At most one active per user.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CoachAssignment {
    pub id: DbId,
    pub coach_id: UserId,
    pub user_id: UserId,
    pub assigned_at: Timestamp,
    pub active: bool,
    pub notes: Option<String>,
    pub deactivated_at: Option<Timestamp>,
}

/// A row from the `coach_invitations` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CoachInvitation {
    pub id: Uuid,
    pub coach_id: UserId,
    pub email: String,
    #[serde(skip_serializing)]
    pub token_hash: String,
    #[sqlx(try_from = "String")]
    pub status: InvitationStatus,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    pub accepted_at: Option<Timestamp>,
    pub accepted_by_user_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInvitation {
    pub id: Uuid,
    pub coach_id: UserId,
    pub email: String,
    pub token_hash: String,
    pub expires_at: Timestamp,
}
