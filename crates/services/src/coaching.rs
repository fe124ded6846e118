//! Coach invitations and assignments.
//!
//! Invitation tokens are generated here and handed out exactly once, on the
//! event bus for the mailer; only their SHA-256 digest is stored.

use std::sync::Arc;

use chrono::Utc;
use fitup_core::error::{CoreError, CoreResult};
use fitup_core::invitation::{
    self, ensure_acceptable, ensure_pending, ensure_resendable, generate_token, hash_token, InvitationStatus,
};
use fitup_core::types::{DbId, Timestamp};
use fitup_core::validation::{clamp_limit, clamp_offset, normalize_email, validate_id, validate_required, validate_user_id};
use fitup_db::models::coach::{CoachAssignment, CoachInvitation, NewInvitation};
use fitup_db::models::messaging::Conversation;
use fitup_db::models::session::WorkoutSession;
use fitup_db::{CoachRepo, ConversationRepo, InvitationRepo, Repository, SessionRepo, Transaction};
use fitup_events::bus::event_types;
use fitup_events::{DomainEvent, EventBus, InvitationNotice};
use serde::Serialize;
use uuid::Uuid;

use crate::access::{ensure_coach, Actor};
use crate::{conflict_as, deadline};

/// A created or resent invitation with its plaintext token.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedInvitation {
    pub invitation: CoachInvitation,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedInvitation {
    pub invitation: CoachInvitation,
    pub assignment: CoachAssignment,
    pub conversation: Conversation,
}

pub struct CoachingService {
    repo: Arc<dyn Repository>,
    bus: Arc<EventBus>,
}

impl CoachingService {
    pub fn new(repo: Arc<dyn Repository>, bus: Arc<EventBus>) -> Self {
        Self { repo, bus }
    }

    /// Invite `email` to train with the acting coach. Valid for seven days.
    pub async fn create_invitation(&self, actor: &Actor, email: &str) -> CoreResult<IssuedInvitation> {
        ensure_coach(actor)?;
        let email = normalize_email(email)?;
        if actor
            .email
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(&email))
        {
            return Err(CoreError::Validation("cannot invite yourself".into()));
        }
        let token = generate_token();

        let invitation = deadline::write("create_invitation", async {
            let mut tx = self.repo.begin().await?;
            let invitation = tx
                .insert_invitation(&NewInvitation {
                    id: Uuid::new_v4(),
                    coach_id: actor.user_id.clone(),
                    email,
                    token_hash: hash_token(&token),
                    expires_at: invitation::expires_at(Utc::now()),
                })
                .await
                .map_err(conflict_as("a pending invitation for this email already exists"))?;
            tx.commit().await?;
            Ok(invitation)
        })
        .await?;

        tracing::info!(invitation_id = %invitation.id, coach_id = %actor.user_id, "Invitation created");
        self.announce(event_types::INVITATION_CREATED, &invitation, &token);
        Ok(IssuedInvitation { invitation, token })
    }

    pub async fn list_invitations(&self, actor: &Actor) -> CoreResult<Vec<CoachInvitation>> {
        ensure_coach(actor)?;
        deadline::read("list_invitations", async {
            let mut tx = self.repo.begin().await?;
            let invitations = tx.list_invitations(&actor.user_id).await?;
            tx.commit().await?;
            Ok(invitations)
        })
        .await
    }

    /// Issue a fresh token for a pending invitation and restart its expiry.
    pub async fn resend_invitation(&self, actor: &Actor, invitation_id: Uuid) -> CoreResult<IssuedInvitation> {
        ensure_coach(actor)?;
        let token = generate_token();

        let invitation = deadline::write("resend_invitation", async {
            let mut tx = self.repo.begin().await?;
            let invitation = own_invitation(&mut *tx, actor, invitation_id).await?;
            ensure_resendable(invitation.status)?;
            let invitation = tx
                .refresh_invitation_token(invitation.id, &hash_token(&token), invitation::expires_at(Utc::now()))
                .await
                .map_err(conflict_as("a newer pending invitation exists for this email"))?;
            tx.commit().await?;
            Ok(invitation)
        })
        .await?;

        tracing::info!(invitation_id = %invitation.id, coach_id = %actor.user_id, "Invitation resent");
        self.announce(event_types::INVITATION_RESENT, &invitation, &token);
        Ok(IssuedInvitation { invitation, token })
    }

    pub async fn cancel_invitation(&self, actor: &Actor, invitation_id: Uuid) -> CoreResult<CoachInvitation> {
        ensure_coach(actor)?;
        deadline::write("cancel_invitation", async {
            let mut tx = self.repo.begin().await?;
            let invitation = own_invitation(&mut *tx, actor, invitation_id).await?;
            ensure_pending(invitation.status)?;
            let invitation = tx
                .set_invitation_status(invitation.id, InvitationStatus::Cancelled)
                .await?;
            tx.commit().await?;
            tracing::info!(invitation_id = %invitation.id, "Invitation cancelled");
            Ok(invitation)
        })
        .await
    }

    /// Accept an invitation as the invited user.
    ///
    /// The actor's email must match the invited address. Creates the active
    /// assignment and the coach/client conversation in one transaction.
    pub async fn accept_invitation(&self, actor: &Actor, token: &str) -> CoreResult<AcceptedInvitation> {
        validate_required(token, "token")?;
        let actor_email = actor
            .email
            .as_deref()
            .ok_or_else(|| CoreError::Forbidden("an email address is required to accept invitations".into()))
            .and_then(normalize_email)?;

        deadline::write("accept_invitation", async {
            let now = Utc::now();
            let mut tx = self.repo.begin().await?;
            let invitation = tx
                .find_invitation_by_token_hash(&hash_token(token))
                .await?
                .ok_or_else(|| CoreError::not_found("Invitation", "token"))?;

            if let Err(e) = ensure_acceptable(invitation.status, invitation.expires_at, now) {
                if invitation.status == InvitationStatus::Pending {
                    tx.set_invitation_status(invitation.id, InvitationStatus::Expired).await?;
                    tx.commit().await?;
                }
                return Err(e);
            }
            if invitation.email != actor_email {
                return Err(CoreError::Forbidden("invitation was sent to a different email address".into()));
            }
            if invitation.coach_id == actor.user_id {
                return Err(CoreError::Validation("cannot accept your own invitation".into()));
            }

            let assignment = tx
                .insert_assignment(&invitation.coach_id, &actor.user_id, None)
                .await
                .map_err(conflict_as("user already has an active coach"))?;
            let invitation = tx.mark_invitation_accepted(invitation.id, &actor.user_id, now).await?;
            let conversation = match tx
                .find_conversation_between(&invitation.coach_id, &actor.user_id)
                .await?
            {
                Some(existing) => existing,
                None => tx.create_conversation(&invitation.coach_id, &actor.user_id).await?,
            };
            tx.commit().await?;

            tracing::info!(
                invitation_id = %invitation.id,
                coach_id = %invitation.coach_id,
                user_id = %actor.user_id,
                assignment_id = assignment.id,
                "Invitation accepted"
            );
            Ok(AcceptedInvitation {
                invitation,
                assignment,
                conversation,
            })
        })
        .await
    }

    /// Move every pending invitation past its expiry to `expired`.
    pub async fn expire_invitations(&self, now: Timestamp) -> CoreResult<u64> {
        deadline::write("expire_invitations", async {
            let mut tx = self.repo.begin().await?;
            let expired = tx.expire_invitations(now).await?;
            tx.commit().await?;
            Ok(expired)
        })
        .await
    }

    pub async fn list_clients(&self, actor: &Actor, active_only: bool) -> CoreResult<Vec<CoachAssignment>> {
        ensure_coach(actor)?;
        deadline::read("list_clients", async {
            let mut tx = self.repo.begin().await?;
            let assignments = tx.list_assignments_for_coach(&actor.user_id, active_only).await?;
            tx.commit().await?;
            Ok(assignments)
        })
        .await
    }

    /// End an assignment. Either side or an admin may do so; repeating it is
    /// a no-op.
    pub async fn deactivate_assignment(&self, actor: &Actor, assignment_id: DbId) -> CoreResult<CoachAssignment> {
        validate_id(assignment_id, "assignment id")?;
        deadline::write("deactivate_assignment", async {
            let mut tx = self.repo.begin().await?;
            let assignment = tx.get_assignment(assignment_id).await?;
            let party = assignment.coach_id == actor.user_id || assignment.user_id == actor.user_id;
            if !party && !actor.is_admin() {
                return Err(CoreError::Forbidden("not a party to this assignment".into()));
            }
            let assignment = tx.deactivate_assignment(assignment_id, Utc::now()).await?;
            tx.commit().await?;
            tracing::info!(assignment_id, coach_id = %assignment.coach_id, user_id = %assignment.user_id, "Assignment deactivated");
            Ok(assignment)
        })
        .await
    }

    /// A client's session history, for their assigned coach.
    pub async fn client_sessions(
        &self,
        actor: &Actor,
        client_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> CoreResult<Vec<WorkoutSession>> {
        ensure_coach(actor)?;
        validate_user_id(client_id)?;
        let (limit, offset) = (clamp_limit(limit), clamp_offset(offset));

        deadline::read("client_sessions", async {
            let mut tx = self.repo.begin().await?;
            if !actor.is_admin() && !tx.has_active_assignment(&actor.user_id, client_id).await? {
                return Err(CoreError::Forbidden("no active assignment for this client".into()));
            }
            let sessions = tx.list_sessions(client_id, None, None, limit, offset).await?;
            tx.commit().await?;
            Ok(sessions)
        })
        .await
    }

    fn announce(&self, event_type: &str, invitation: &CoachInvitation, token: &str) {
        let notice = InvitationNotice {
            invitation_id: invitation.id,
            coach_id: invitation.coach_id.clone(),
            email: invitation.email.clone(),
            token: token.to_string(),
            expires_at: invitation.expires_at,
        };
        self.bus.publish(DomainEvent::invitation(event_type, &notice));
    }
}

async fn own_invitation(tx: &mut dyn Transaction, actor: &Actor, invitation_id: Uuid) -> CoreResult<CoachInvitation> {
    let invitation = tx.get_invitation(invitation_id).await?;
    if invitation.coach_id != actor.user_id && !actor.is_admin() {
        return Err(CoreError::Forbidden("invitation belongs to another coach".into()));
    }
    Ok(invitation)
}
