//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] carries [`DomainEvent`]s from the services to background
//! consumers such as the invitation mailer. Share it via `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use fitup_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Event names published on the bus.
pub mod event_types {
    pub const INVITATION_CREATED: &str = "invitation.created";
    pub const INVITATION_RESENT: &str = "invitation.resent";
    pub const SESSION_COMPLETED: &str = "session.completed";
    pub const PLAN_ADAPTED: &str = "plan.adapted";
}

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

/// Something that happened in the domain.
///
/// Built with [`DomainEvent::new`] and the `with_*` builder methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Dot-separated event name, e.g. `"invitation.created"`.
    pub event_type: String,

    /// Source entity kind (`"invitation"`, `"plan"`, ...).
    pub source_entity_type: Option<String>,

    /// Source entity id in its text form (integer ids and invitation UUIDs).
    pub source_entity_id: Option<String>,

    /// Auth user id of the actor.
    pub actor_user_id: Option<String>,

    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: impl ToString) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id.to_string());
        self
    }

    pub fn with_actor(mut self, user_id: impl Into<String>) -> Self {
        self.actor_user_id = Some(user_id.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// An `invitation.created` / `invitation.resent` event.
    pub fn invitation(event_type: &str, notice: &InvitationNotice) -> Self {
        Self::new(event_type)
            .with_source("invitation", notice.invitation_id)
            .with_actor(notice.coach_id.clone())
            .with_payload(serde_json::to_value(notice).unwrap_or_default())
    }
}

/// Payload of invitation events. Carries the plaintext token so the mailer
/// can build the accept link; the token is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvitationNotice {
    pub invitation_id: Uuid,
    pub coach_id: String,
    pub email: String,
    pub token: String,
    pub expires_at: Timestamp,
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// When the buffer is full the oldest unconsumed events are dropped and slow
/// receivers observe `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers; dropped silently when there are none.
    pub fn publish(&self, event: DomainEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
