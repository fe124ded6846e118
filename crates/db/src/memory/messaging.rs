use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::Utc;
use fitup_core::types::DbId;

use super::{conflict, MemoryState, MemoryTransaction};
use crate::error::{OrNotFound, RepoError, RepoResult};
use crate::models::messaging::{
    Attachment, Conversation, ConversationSummary, Message, NewMessage, ReadStatus,
};
use crate::repository::{ConversationRepo, MessageRepo};

impl MemoryState {
    fn with_attachments(&self, message: &Message) -> Message {
        let mut message = message.clone();
        message.attachments = self
            .attachments
            .values()
            .filter(|a| a.message_id == message.id)
            .cloned()
            .collect();
        message
    }

    fn is_unread(&self, message: &Message, conversation_id: DbId, user_id: &str) -> bool {
        message.conversation_id == conversation_id
            && message.sender_id != user_id
            && message.deleted_at.is_none()
            && !self
                .read_status
                .contains_key(&(message.id, user_id.to_string()))
    }

    fn unread(&self, conversation_id: DbId, user_id: &str) -> Vec<DbId> {
        self.messages
            .values()
            .filter(|m| self.is_unread(m, conversation_id, user_id))
            .map(|m| m.id)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Conversations
// ---------------------------------------------------------------------------

#[async_trait]
impl ConversationRepo for MemoryTransaction {
    async fn create_conversation(&mut self, coach_id: &str, client_id: &str) -> RepoResult<Conversation> {
        let state = self.state();
        if state
            .conversations
            .values()
            .any(|c| c.has_participant(coach_id) && c.has_participant(client_id))
        {
            return Err(conflict("uq_conversations_pair"));
        }
        let row = Conversation {
            id: state.next_id("conversations"),
            coach_id: coach_id.to_string(),
            client_id: client_id.to_string(),
            created_at: Utc::now(),
            archived: false,
            last_message_at: None,
        };
        state.conversations.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_conversation_between(&mut self, a: &str, b: &str) -> RepoResult<Option<Conversation>> {
        Ok(self
            .state()
            .conversations
            .values()
            .find(|c| c.has_participant(a) && c.has_participant(b))
            .cloned())
    }

    async fn get_conversation(&mut self, id: DbId) -> RepoResult<Conversation> {
        self.state()
            .conversations
            .get(&id)
            .cloned()
            .or_not_found("Conversation", id)
    }

    async fn list_conversations(
        &mut self,
        user_id: &str,
        include_archived: bool,
    ) -> RepoResult<Vec<ConversationSummary>> {
        let state = self.state();
        let mut conversations: Vec<&Conversation> = state
            .conversations
            .values()
            .filter(|c| c.has_participant(user_id) && (include_archived || !c.archived))
            .collect();
        conversations.sort_by_key(|c| Reverse((c.last_message_at.unwrap_or(c.created_at), c.id)));

        Ok(conversations
            .into_iter()
            .map(|c| {
                let last_message = state
                    .messages
                    .values()
                    .filter(|m| m.conversation_id == c.id && m.deleted_at.is_none())
                    .max_by_key(|m| m.id)
                    .map(|m| state.with_attachments(m));
                ConversationSummary {
                    conversation: c.clone(),
                    last_message,
                    unread_count: state.unread(c.id, user_id).len() as i64,
                }
            })
            .collect())
    }

    async fn set_conversation_archived(&mut self, id: DbId, archived: bool) -> RepoResult<Conversation> {
        let row = self
            .state()
            .conversations
            .get_mut(&id)
            .or_not_found("Conversation", id)?;
        row.archived = archived;
        Ok(row.clone())
    }

    async fn delete_conversation(&mut self, id: DbId) -> RepoResult<()> {
        let state = self.state();
        if state.conversations.remove(&id).is_none() {
            return Err(RepoError::not_found("Conversation", id));
        }
        let message_ids: Vec<DbId> = state
            .messages
            .values()
            .filter(|m| m.conversation_id == id)
            .map(|m| m.id)
            .collect();
        state.messages.retain(|_, m| m.conversation_id != id);
        state.attachments.retain(|_, a| !message_ids.contains(&a.message_id));
        state.read_status.retain(|(message_id, _), _| !message_ids.contains(message_id));
        Ok(())
    }

    async fn is_participant(&mut self, conversation_id: DbId, user_id: &str) -> RepoResult<bool> {
        Ok(self
            .state()
            .conversations
            .get(&conversation_id)
            .is_some_and(|c| c.has_participant(user_id)))
    }
}

// ---------------------------------------------------------------------------
// Messages and read status
// ---------------------------------------------------------------------------

#[async_trait]
impl MessageRepo for MemoryTransaction {
    async fn insert_message(&mut self, input: &NewMessage) -> RepoResult<Message> {
        let state = self.state();
        if !state.conversations.contains_key(&input.conversation_id) {
            return Err(RepoError::not_found("Conversation", input.conversation_id));
        }
        let now = Utc::now();
        let message = Message {
            id: state.next_id("messages"),
            conversation_id: input.conversation_id,
            sender_id: input.sender_id.clone(),
            text: input.text.clone(),
            reply_to_message_id: input.reply_to_message_id,
            created_at: now,
            edited_at: None,
            deleted_at: None,
            attachments: Vec::new(),
        };
        state.messages.insert(message.id, message.clone());

        for a in &input.attachments {
            let attachment = Attachment {
                id: state.next_id("message_attachments"),
                message_id: message.id,
                attachment_type: a.attachment_type,
                file_name: a.file_name.clone(),
                url: a.url.clone(),
                size_bytes: a.size_bytes,
                created_at: now,
            };
            state.attachments.insert(attachment.id, attachment);
        }

        if let Some(conversation) = state.conversations.get_mut(&input.conversation_id) {
            conversation.last_message_at = Some(now);
        }
        Ok(state.with_attachments(&message))
    }

    async fn get_message(&mut self, id: DbId) -> RepoResult<Message> {
        let state = self.state();
        state
            .messages
            .get(&id)
            .map(|m| state.with_attachments(m))
            .or_not_found("Message", id)
    }

    async fn list_messages(
        &mut self,
        conversation_id: DbId,
        before_id: Option<DbId>,
        limit: i64,
    ) -> RepoResult<Vec<Message>> {
        let state = self.state();
        Ok(state
            .messages
            .values()
            .rev()
            .filter(|m| m.conversation_id == conversation_id && m.deleted_at.is_none())
            .filter(|m| before_id.is_none_or(|b| m.id < b))
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|m| state.with_attachments(m))
            .collect())
    }

    async fn update_message_text(&mut self, id: DbId, text: &str) -> RepoResult<Message> {
        let state = self.state();
        let message = state.messages.get_mut(&id).or_not_found("Message", id)?;
        message.text = text.to_string();
        message.edited_at = Some(Utc::now());
        let message = message.clone();
        Ok(state.with_attachments(&message))
    }

    async fn soft_delete_message(&mut self, id: DbId) -> RepoResult<Message> {
        let message = self.state().messages.get_mut(&id).or_not_found("Message", id)?;
        message.deleted_at.get_or_insert_with(Utc::now);
        Ok(message.clone())
    }

    async fn mark_read(&mut self, message_id: DbId, user_id: &str) -> RepoResult<bool> {
        let state = self.state();
        if !state.messages.contains_key(&message_id) {
            return Err(RepoError::not_found("Message", message_id));
        }
        let key = (message_id, user_id.to_string());
        if state.read_status.contains_key(&key) {
            return Ok(false);
        }
        state.read_status.insert(
            key,
            ReadStatus {
                message_id,
                user_id: user_id.to_string(),
                read_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn mark_conversation_read(&mut self, conversation_id: DbId, user_id: &str) -> RepoResult<Vec<DbId>> {
        let state = self.state();
        let ids = state.unread(conversation_id, user_id);
        let now = Utc::now();
        for &message_id in &ids {
            state.read_status.insert(
                (message_id, user_id.to_string()),
                ReadStatus {
                    message_id,
                    user_id: user_id.to_string(),
                    read_at: now,
                },
            );
        }
        Ok(ids)
    }

    async fn unread_count(&mut self, conversation_id: DbId, user_id: &str) -> RepoResult<i64> {
        Ok(self.state().unread(conversation_id, user_id).len() as i64)
    }
}
