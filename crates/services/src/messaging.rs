//! Coach/client conversations and realtime fan-out.
//!
//! Writes commit first, then both participants are subscribed to the
//! conversation channel (lazily, on the first event) and the lifecycle event
//! is broadcast through the hub. Writes to one conversation hold its lock
//! from the commit through the broadcast, so subscribers see events in
//! commit order.

use std::sync::Arc;

use chrono::Utc;
use fitup_core::error::{CoreError, CoreResult};
use fitup_core::messaging::{
    conversation_channel, parse_channel, validate_conversation_id, validate_message_text, AttachmentInput, HubEvent,
    HubEventType,
};
use fitup_core::types::DbId;
use fitup_core::validation::{clamp_limit, validate_id, validate_user_id};
use fitup_db::models::messaging::{Conversation, ConversationSummary, Message, NewMessage};
use fitup_db::{CoachRepo, ConversationRepo, MessageRepo, Repository, Transaction};
use fitup_events::Hub;
use serde::Deserialize;

use crate::access::Actor;
use crate::locks::{KeyedGuard, KeyedLocks};
use crate::{conflict_as, deadline};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SendMessage {
    pub conversation_id: DbId,
    pub text: String,
    #[serde(default)]
    pub reply_to_message_id: Option<DbId>,
    #[serde(default)]
    pub attachments: Vec<AttachmentInput>,
}

pub struct MessagingService {
    repo: Arc<dyn Repository>,
    hub: Arc<Hub>,
    conversation_locks: KeyedLocks<DbId>,
}

impl MessagingService {
    pub fn new(repo: Arc<dyn Repository>, hub: Arc<Hub>) -> Self {
        Self {
            repo,
            hub,
            conversation_locks: KeyedLocks::new(),
        }
    }

    /// Open (or return the existing) conversation between the actor and a
    /// user they have an active coaching relationship with.
    pub async fn create_conversation(&self, actor: &Actor, other_user_id: &str) -> CoreResult<Conversation> {
        validate_user_id(other_user_id)?;
        if other_user_id == actor.user_id {
            return Err(CoreError::Validation("cannot start a conversation with yourself".into()));
        }

        deadline::write("create_conversation", async {
            let mut tx = self.repo.begin().await?;
            let (coach_id, client_id) = if tx.has_active_assignment(&actor.user_id, other_user_id).await? {
                (actor.user_id.as_str(), other_user_id)
            } else if tx.has_active_assignment(other_user_id, &actor.user_id).await? {
                (other_user_id, actor.user_id.as_str())
            } else {
                return Err(CoreError::Forbidden("no active coaching relationship with this user".into()));
            };

            if let Some(existing) = tx.find_conversation_between(coach_id, client_id).await? {
                return Ok(existing);
            }
            let conversation = tx
                .create_conversation(coach_id, client_id)
                .await
                .map_err(conflict_as("conversation already exists"))?;
            tx.commit().await?;
            tracing::info!(conversation_id = conversation.id, coach_id = %coach_id, client_id = %client_id, "Conversation created");
            Ok(conversation)
        })
        .await
    }

    pub async fn list_conversations(&self, actor: &Actor, include_archived: bool) -> CoreResult<Vec<ConversationSummary>> {
        deadline::read("list_conversations", async {
            let mut tx = self.repo.begin().await?;
            let conversations = tx.list_conversations(&actor.user_id, include_archived).await?;
            tx.commit().await?;
            Ok(conversations)
        })
        .await
    }

    /// Messages newest first, older than `before_id` when paging back.
    pub async fn list_messages(
        &self,
        actor: &Actor,
        conversation_id: DbId,
        before_id: Option<DbId>,
        limit: Option<i64>,
    ) -> CoreResult<Vec<Message>> {
        validate_conversation_id(conversation_id)?;
        if let Some(before) = before_id {
            validate_id(before, "before id")?;
        }
        let limit = clamp_limit(limit);

        deadline::read("list_messages", async {
            let mut tx = self.repo.begin().await?;
            participant_conversation(&mut *tx, conversation_id, &actor.user_id).await?;
            let messages = tx.list_messages(conversation_id, before_id, limit).await?;
            tx.commit().await?;
            Ok(messages)
        })
        .await
    }

    pub async fn send(&self, actor: &Actor, input: SendMessage) -> CoreResult<Message> {
        validate_conversation_id(input.conversation_id)?;
        validate_message_text(&input.text)?;
        for attachment in &input.attachments {
            attachment.validate()?;
        }
        if let Some(reply_to) = input.reply_to_message_id {
            validate_id(reply_to, "reply to message id")?;
        }

        let _order = self.conversation_locks.acquire(input.conversation_id).await;
        let (conversation, message) = deadline::write("send_message", async {
            let mut tx = self.repo.begin().await?;
            let conversation = participant_conversation(&mut *tx, input.conversation_id, &actor.user_id).await?;
            if let Some(reply_to) = input.reply_to_message_id {
                let original = tx.get_message(reply_to).await?;
                if original.conversation_id != conversation.id {
                    return Err(CoreError::Validation(
                        "replied-to message belongs to another conversation".into(),
                    ));
                }
            }
            let message = tx
                .insert_message(&NewMessage {
                    conversation_id: conversation.id,
                    sender_id: actor.user_id.clone(),
                    text: input.text,
                    reply_to_message_id: input.reply_to_message_id,
                    attachments: input.attachments,
                })
                .await?;
            tx.commit().await?;
            Ok((conversation, message))
        })
        .await?;

        tracing::debug!(conversation_id = conversation.id, message_id = message.id, sender = %actor.user_id, "Message sent");
        self.publish(&conversation, HubEventType::NewMessage, &message).await;
        Ok(message)
    }

    /// Replace the text of the actor's own message.
    pub async fn edit(&self, actor: &Actor, message_id: DbId, text: &str) -> CoreResult<Message> {
        validate_id(message_id, "message id")?;
        validate_message_text(text)?;

        let _order = self.lock_message_conversation(message_id).await?;
        let (conversation, message) = deadline::write("edit_message", async {
            let mut tx = self.repo.begin().await?;
            let original = own_live_message(&mut *tx, message_id, &actor.user_id).await?;
            let conversation = tx.get_conversation(original.conversation_id).await?;
            let message = tx.update_message_text(message_id, text).await?;
            tx.commit().await?;
            Ok((conversation, message))
        })
        .await?;

        self.publish(&conversation, HubEventType::MessageEdited, &message).await;
        Ok(message)
    }

    /// Soft-delete the actor's own message.
    pub async fn delete(&self, actor: &Actor, message_id: DbId) -> CoreResult<()> {
        validate_id(message_id, "message id")?;

        let _order = self.lock_message_conversation(message_id).await?;
        let (conversation, message) = deadline::write("delete_message", async {
            let mut tx = self.repo.begin().await?;
            own_live_message(&mut *tx, message_id, &actor.user_id).await?;
            let message = tx.soft_delete_message(message_id).await?;
            let conversation = tx.get_conversation(message.conversation_id).await?;
            tx.commit().await?;
            Ok((conversation, message))
        })
        .await?;

        self.ensure_subscribed(&conversation).await;
        let event = HubEvent::message(
            HubEventType::MessageDeleted,
            conversation.id,
            message.id,
            None,
            Utc::now(),
        );
        self.hub
            .broadcast_to_channel(&conversation_channel(conversation.id), &event)
            .await;
        Ok(())
    }

    /// Record that the actor read a message. Returns `false` when it was
    /// already read (or is the actor's own), in which case nothing is
    /// broadcast.
    pub async fn mark_read(&self, actor: &Actor, message_id: DbId) -> CoreResult<bool> {
        validate_id(message_id, "message id")?;

        let _order = self.lock_message_conversation(message_id).await?;
        let (conversation, newly_read) = deadline::write("mark_read", async {
            let mut tx = self.repo.begin().await?;
            let message = tx.get_message(message_id).await?;
            let conversation = participant_conversation(&mut *tx, message.conversation_id, &actor.user_id).await?;
            if message.sender_id == actor.user_id || message.deleted_at.is_some() {
                return Ok((conversation, false));
            }
            let newly_read = tx.mark_read(message_id, &actor.user_id).await?;
            tx.commit().await?;
            Ok((conversation, newly_read))
        })
        .await?;

        if newly_read {
            self.publish_read(&conversation, &[message_id], &actor.user_id).await;
        }
        Ok(newly_read)
    }

    /// Mark every unread message from the other participant. Returns the ids
    /// newly marked.
    pub async fn mark_conversation_read(&self, actor: &Actor, conversation_id: DbId) -> CoreResult<Vec<DbId>> {
        validate_conversation_id(conversation_id)?;

        let _order = self.conversation_locks.acquire(conversation_id).await;
        let (conversation, marked) = deadline::write("mark_conversation_read", async {
            let mut tx = self.repo.begin().await?;
            let conversation = participant_conversation(&mut *tx, conversation_id, &actor.user_id).await?;
            let marked = tx.mark_conversation_read(conversation_id, &actor.user_id).await?;
            tx.commit().await?;
            Ok((conversation, marked))
        })
        .await?;

        self.publish_read(&conversation, &marked, &actor.user_id).await;
        Ok(marked)
    }

    pub async fn archive(&self, actor: &Actor, conversation_id: DbId, archived: bool) -> CoreResult<Conversation> {
        validate_conversation_id(conversation_id)?;
        deadline::write("archive_conversation", async {
            let mut tx = self.repo.begin().await?;
            participant_conversation(&mut *tx, conversation_id, &actor.user_id).await?;
            let conversation = tx.set_conversation_archived(conversation_id, archived).await?;
            tx.commit().await?;
            Ok(conversation)
        })
        .await
    }

    /// Subscribe a connected user to a `conversation:{id}` channel after the
    /// participant check. Returns the conversation id.
    pub async fn subscribe(&self, user_id: &str, channel: &str) -> CoreResult<DbId> {
        let conversation_id = parse_channel(channel)?;
        deadline::read("subscribe", async {
            let mut tx = self.repo.begin().await?;
            let participant = tx.is_participant(conversation_id, user_id).await?;
            tx.commit().await?;
            if !participant {
                return Err(CoreError::Forbidden(format!(
                    "not a participant of conversation {conversation_id}"
                )));
            }
            Ok(())
        })
        .await?;

        self.hub.subscribe(user_id, channel).await;
        Ok(conversation_id)
    }

    pub async fn unsubscribe(&self, user_id: &str, channel: &str) -> CoreResult<DbId> {
        let conversation_id = parse_channel(channel)?;
        self.hub.unsubscribe(user_id, channel).await;
        Ok(conversation_id)
    }

    // -- fan-out ------------------------------------------------------------

    /// Lock the conversation a message belongs to. A message never moves
    /// between conversations, so the lookup may run before the lock.
    async fn lock_message_conversation(&self, message_id: DbId) -> CoreResult<KeyedGuard<'_, DbId>> {
        let conversation_id = deadline::read("message_conversation", async {
            let mut tx = self.repo.begin().await?;
            let message = tx.get_message(message_id).await?;
            tx.commit().await?;
            Ok(message.conversation_id)
        })
        .await?;
        Ok(self.conversation_locks.acquire(conversation_id).await)
    }

    async fn ensure_subscribed(&self, conversation: &Conversation) {
        let channel = conversation_channel(conversation.id);
        for participant in [&conversation.coach_id, &conversation.client_id] {
            if self.hub.subscribe(participant, &channel).await {
                tracing::debug!(user_id = %participant, channel = %channel, "Lazily subscribed participant");
            }
        }
    }

    async fn publish(&self, conversation: &Conversation, event_type: HubEventType, message: &Message) {
        self.ensure_subscribed(conversation).await;
        let payload = match serde_json::to_value(message) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(message_id = message.id, error = %e, "Failed to encode message for broadcast");
                None
            }
        };
        let event = HubEvent::message(event_type, conversation.id, message.id, payload, Utc::now());
        let delivered = self
            .hub
            .broadcast_to_channel(&conversation_channel(conversation.id), &event)
            .await;
        tracing::debug!(conversation_id = conversation.id, message_id = message.id, %event_type, delivered, "Broadcast");
    }

    async fn publish_read(&self, conversation: &Conversation, message_ids: &[DbId], reader: &str) {
        if message_ids.is_empty() {
            return;
        }
        self.ensure_subscribed(conversation).await;
        let channel = conversation_channel(conversation.id);
        for &message_id in message_ids {
            let event = HubEvent::read(conversation.id, message_id, reader, Utc::now());
            self.hub.broadcast_to_channel(&channel, &event).await;
        }
    }
}

async fn participant_conversation(
    tx: &mut dyn Transaction,
    conversation_id: DbId,
    user_id: &str,
) -> CoreResult<Conversation> {
    let conversation = tx.get_conversation(conversation_id).await?;
    if !conversation.has_participant(user_id) {
        return Err(CoreError::Forbidden(format!(
            "not a participant of conversation {conversation_id}"
        )));
    }
    Ok(conversation)
}

/// The sender's own, not yet deleted, message.
async fn own_live_message(tx: &mut dyn Transaction, message_id: DbId, user_id: &str) -> CoreResult<Message> {
    let message = tx.get_message(message_id).await?;
    if message.sender_id != user_id {
        return Err(CoreError::Forbidden("only the sender may change a message".into()));
    }
    if message.deleted_at.is_some() {
        return Err(CoreError::not_found("Message", message_id));
    }
    Ok(message)
}
