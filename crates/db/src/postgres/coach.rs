use async_trait::async_trait;
use uuid::Uuid;
use fitup_core::invitation::InvitationStatus;
use fitup_core::types::{DbId, Timestamp};

use super::PgTransaction;
use crate::error::{OrNotFound, RepoResult};
use crate::models::coach::{CoachAssignment, CoachInvitation, NewInvitation};
use crate::repository::{CoachRepo, InvitationRepo};

const ASSIGNMENT_COLUMNS: &str = "\
    id, coach_id, user_id, assigned_at, active, notes, deactivated_at";

const INVITATION_COLUMNS: &str = "\
    id, coach_id, email, token_hash, status, expires_at, created_at, \
    accepted_at, accepted_by_user_id";

// ---------------------------------------------------------------------------
// Assignments
// ---------------------------------------------------------------------------

#[async_trait]
impl CoachRepo for PgTransaction {
    async fn insert_assignment(
        &mut self,
        coach_id: &str,
        user_id: &str,
        notes: Option<&str>,
    ) -> RepoResult<CoachAssignment> {
        let query = format!(
            "INSERT INTO coach_assignments (coach_id, user_id, notes) \
             VALUES ($1, $2, $3) \
             RETURNING {ASSIGNMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CoachAssignment>(&query)
            .bind(coach_id)
            .bind(user_id)
            .bind(notes)
            .fetch_one(self.conn())
            .await?;
        Ok(row)
    }

    async fn get_assignment(&mut self, id: DbId) -> RepoResult<CoachAssignment> {
        let query = format!("SELECT {ASSIGNMENT_COLUMNS} FROM coach_assignments WHERE id = $1");
        sqlx::query_as::<_, CoachAssignment>(&query)
            .bind(id)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("CoachAssignment", id)
    }

    async fn active_assignment_for_user(&mut self, user_id: &str) -> RepoResult<Option<CoachAssignment>> {
        let query = format!("SELECT {ASSIGNMENT_COLUMNS} FROM coach_assignments WHERE user_id = $1 AND active");
        let row = sqlx::query_as::<_, CoachAssignment>(&query)
            .bind(user_id)
            .fetch_optional(self.conn())
            .await?;
        Ok(row)
    }

    async fn list_assignments_for_coach(
        &mut self,
        coach_id: &str,
        active_only: bool,
    ) -> RepoResult<Vec<CoachAssignment>> {
        let query = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM coach_assignments \
             WHERE coach_id = $1 AND (NOT $2 OR active) \
             ORDER BY assigned_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, CoachAssignment>(&query)
            .bind(coach_id)
            .bind(active_only)
            .fetch_all(self.conn())
            .await?;
        Ok(rows)
    }

    async fn deactivate_assignment(&mut self, id: DbId, at: Timestamp) -> RepoResult<CoachAssignment> {
        let query = format!(
            "UPDATE coach_assignments \
             SET active = FALSE, deactivated_at = COALESCE(deactivated_at, $2) \
             WHERE id = $1 RETURNING {ASSIGNMENT_COLUMNS}"
        );
        sqlx::query_as::<_, CoachAssignment>(&query)
            .bind(id)
            .bind(at)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("CoachAssignment", id)
    }

    async fn has_active_assignment(&mut self, coach_id: &str, user_id: &str) -> RepoResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM coach_assignments \
             WHERE coach_id = $1 AND user_id = $2 AND active)",
        )
        .bind(coach_id)
        .bind(user_id)
        .fetch_one(self.conn())
        .await?;
        Ok(exists)
    }
}

// ---------------------------------------------------------------------------
// Invitations
// ---------------------------------------------------------------------------

#[async_trait]
impl InvitationRepo for PgTransaction {
    async fn insert_invitation(&mut self, input: &NewInvitation) -> RepoResult<CoachInvitation> {
        let query = format!(
            "INSERT INTO coach_invitations (id, coach_id, email, token_hash, status, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {INVITATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CoachInvitation>(&query)
            .bind(input.id)
            .bind(&input.coach_id)
            .bind(&input.email)
            .bind(&input.token_hash)
            .bind(InvitationStatus::Pending.as_str())
            .bind(input.expires_at)
            .fetch_one(self.conn())
            .await?;
        Ok(row)
    }

    async fn get_invitation(&mut self, id: Uuid) -> RepoResult<CoachInvitation> {
        let query = format!("SELECT {INVITATION_COLUMNS} FROM coach_invitations WHERE id = $1");
        sqlx::query_as::<_, CoachInvitation>(&query)
            .bind(id)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("CoachInvitation", id)
    }

    async fn find_invitation_by_token_hash(&mut self, token_hash: &str) -> RepoResult<Option<CoachInvitation>> {
        let query = format!("SELECT {INVITATION_COLUMNS} FROM coach_invitations WHERE token_hash = $1");
        let row = sqlx::query_as::<_, CoachInvitation>(&query)
            .bind(token_hash)
            .fetch_optional(self.conn())
            .await?;
        Ok(row)
    }

    async fn list_invitations(&mut self, coach_id: &str) -> RepoResult<Vec<CoachInvitation>> {
        let query = format!(
            "SELECT {INVITATION_COLUMNS} FROM coach_invitations WHERE coach_id = $1 \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, CoachInvitation>(&query)
            .bind(coach_id)
            .fetch_all(self.conn())
            .await?;
        Ok(rows)
    }

    async fn refresh_invitation_token(
        &mut self,
        id: Uuid,
        token_hash: &str,
        expires_at: Timestamp,
    ) -> RepoResult<CoachInvitation> {
        let query = format!(
            "UPDATE coach_invitations SET token_hash = $2, expires_at = $3, status = 'pending' \
             WHERE id = $1 RETURNING {INVITATION_COLUMNS}"
        );
        sqlx::query_as::<_, CoachInvitation>(&query)
            .bind(id)
            .bind(token_hash)
            .bind(expires_at)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("CoachInvitation", id)
    }

    async fn set_invitation_status(&mut self, id: Uuid, status: InvitationStatus) -> RepoResult<CoachInvitation> {
        let query = format!(
            "UPDATE coach_invitations SET status = $2 WHERE id = $1 RETURNING {INVITATION_COLUMNS}"
        );
        sqlx::query_as::<_, CoachInvitation>(&query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(self.conn())
            .await?
            .or_not_found("CoachInvitation", id)
    }

    async fn mark_invitation_accepted(
        &mut self,
        id: Uuid,
        user_id: &str,
        at: Timestamp,
    ) -> RepoResult<CoachInvitation> {
        let query = format!(
            "UPDATE coach_invitations \
             SET status = $2, accepted_at = $3, accepted_by_user_id = $4 \
             WHERE id = $1 RETURNING {INVITATION_COLUMNS}"
        );
        sqlx::query_as::<_, CoachInvitation>(&query)
            .bind(id)
            .bind(InvitationStatus::Accepted.as_str())
            .bind(at)
            .bind(user_id)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("CoachInvitation", id)
    }

    async fn expire_invitations(&mut self, now: Timestamp) -> RepoResult<u64> {
        let result = sqlx::query(
            "UPDATE coach_invitations SET status = 'expired' \
             WHERE status = 'pending' AND expires_at <= $1",
        )
        .bind(now)
        .execute(self.conn())
        .await?;
        Ok(result.rows_affected())
    }
}
