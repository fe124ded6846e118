use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;
use fitup_core::invitation::InvitationStatus;
use fitup_core::types::{DbId, Timestamp};

use super::{conflict, MemoryTransaction};
use crate::error::{OrNotFound, RepoResult};
use crate::models::coach::{CoachAssignment, CoachInvitation, NewInvitation};
use crate::repository::{CoachRepo, InvitationRepo};

// ---------------------------------------------------------------------------
// Assignments
// ---------------------------------------------------------------------------

#[async_trait]
impl CoachRepo for MemoryTransaction {
    async fn insert_assignment(
        &mut self,
        coach_id: &str,
        user_id: &str,
        notes: Option<&str>,
    ) -> RepoResult<CoachAssignment> {
        let state = self.state();
        if state.assignments.values().any(|a| a.user_id == user_id && a.active) {
            return Err(conflict("uq_coach_assignments_active_user"));
        }
        let row = CoachAssignment {
            id: state.next_id("coach_assignments"),
            coach_id: coach_id.to_string(),
            user_id: user_id.to_string(),
            assigned_at: Utc::now(),
            active: true,
            notes: notes.map(str::to_string),
            deactivated_at: None,
        };
        state.assignments.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_assignment(&mut self, id: DbId) -> RepoResult<CoachAssignment> {
        self.state()
            .assignments
            .get(&id)
            .cloned()
            .or_not_found("CoachAssignment", id)
    }

    async fn active_assignment_for_user(&mut self, user_id: &str) -> RepoResult<Option<CoachAssignment>> {
        Ok(self
            .state()
            .assignments
            .values()
            .find(|a| a.user_id == user_id && a.active)
            .cloned())
    }

    async fn list_assignments_for_coach(
        &mut self,
        coach_id: &str,
        active_only: bool,
    ) -> RepoResult<Vec<CoachAssignment>> {
        let mut rows: Vec<CoachAssignment> = self
            .state()
            .assignments
            .values()
            .filter(|a| a.coach_id == coach_id && (!active_only || a.active))
            .cloned()
            .collect();
        rows.sort_by_key(|a| Reverse((a.assigned_at, a.id)));
        Ok(rows)
    }

    async fn deactivate_assignment(&mut self, id: DbId, at: Timestamp) -> RepoResult<CoachAssignment> {
        let row = self
            .state()
            .assignments
            .get_mut(&id)
            .or_not_found("CoachAssignment", id)?;
        row.active = false;
        row.deactivated_at.get_or_insert(at);
        Ok(row.clone())
    }

    async fn has_active_assignment(&mut self, coach_id: &str, user_id: &str) -> RepoResult<bool> {
        Ok(self
            .state()
            .assignments
            .values()
            .any(|a| a.coach_id == coach_id && a.user_id == user_id && a.active))
    }
}

// ---------------------------------------------------------------------------
// Invitations
// ---------------------------------------------------------------------------

impl MemoryTransaction {
    fn invitation_mut(&mut self, id: Uuid) -> RepoResult<&mut CoachInvitation> {
        self.state()
            .invitations
            .get_mut(&id)
            .or_not_found("CoachInvitation", id)
    }
}

#[async_trait]
impl InvitationRepo for MemoryTransaction {
    async fn insert_invitation(&mut self, input: &NewInvitation) -> RepoResult<CoachInvitation> {
        let state = self.state();
        if state.invitations.values().any(|i| {
            i.coach_id == input.coach_id && i.email == input.email && i.status == InvitationStatus::Pending
        }) {
            return Err(conflict("uq_coach_invitations_pending"));
        }
        if state.invitations.values().any(|i| i.token_hash == input.token_hash) {
            return Err(conflict("uq_coach_invitations_token_hash"));
        }
        let row = CoachInvitation {
            id: input.id,
            coach_id: input.coach_id.clone(),
            email: input.email.clone(),
            token_hash: input.token_hash.clone(),
            status: InvitationStatus::Pending,
            expires_at: input.expires_at,
            created_at: Utc::now(),
            accepted_at: None,
            accepted_by_user_id: None,
        };
        state.invitations.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_invitation(&mut self, id: Uuid) -> RepoResult<CoachInvitation> {
        self.invitation_mut(id).map(|i| i.clone())
    }

    async fn find_invitation_by_token_hash(&mut self, token_hash: &str) -> RepoResult<Option<CoachInvitation>> {
        Ok(self
            .state()
            .invitations
            .values()
            .find(|i| i.token_hash == token_hash)
            .cloned())
    }

    async fn list_invitations(&mut self, coach_id: &str) -> RepoResult<Vec<CoachInvitation>> {
        let mut rows: Vec<CoachInvitation> = self
            .state()
            .invitations
            .values()
            .filter(|i| i.coach_id == coach_id)
            .cloned()
            .collect();
        rows.sort_by_key(|i| Reverse(i.created_at));
        Ok(rows)
    }

    async fn refresh_invitation_token(
        &mut self,
        id: Uuid,
        token_hash: &str,
        expires_at: Timestamp,
    ) -> RepoResult<CoachInvitation> {
        let current = self.invitation_mut(id)?.clone();
        let reopened_clash = self.state().invitations.values().any(|i| {
            i.id != id
                && i.coach_id == current.coach_id
                && i.email == current.email
                && i.status == InvitationStatus::Pending
        });
        if reopened_clash {
            return Err(conflict("uq_coach_invitations_pending"));
        }
        let row = self.invitation_mut(id)?;
        row.token_hash = token_hash.to_string();
        row.expires_at = expires_at;
        row.status = InvitationStatus::Pending;
        Ok(row.clone())
    }

    async fn set_invitation_status(&mut self, id: Uuid, status: InvitationStatus) -> RepoResult<CoachInvitation> {
        let row = self.invitation_mut(id)?;
        row.status = status;
        Ok(row.clone())
    }

    async fn mark_invitation_accepted(
        &mut self,
        id: Uuid,
        user_id: &str,
        at: Timestamp,
    ) -> RepoResult<CoachInvitation> {
        let row = self.invitation_mut(id)?;
        row.status = InvitationStatus::Accepted;
        row.accepted_at = Some(at);
        row.accepted_by_user_id = Some(user_id.to_string());
        Ok(row.clone())
    }

    async fn expire_invitations(&mut self, now: Timestamp) -> RepoResult<u64> {
        let mut expired = 0;
        for row in self.state().invitations.values_mut() {
            if row.status == InvitationStatus::Pending && row.expires_at <= now {
                row.status = InvitationStatus::Expired;
                expired += 1;
            }
        }
        Ok(expired)
    }
}
