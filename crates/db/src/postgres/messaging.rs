use std::collections::HashMap;

use async_trait::async_trait;
use fitup_core::types::DbId;

use super::PgTransaction;
use crate::error::{OrNotFound, RepoError, RepoResult};
use crate::models::messaging::{Attachment, Conversation, ConversationSummary, Message, NewMessage};
use crate::repository::{ConversationRepo, MessageRepo};

const CONVERSATION_COLUMNS: &str = "id, coach_id, client_id, created_at, archived, last_message_at";

/// Column list for `messages` queries.
const MESSAGE_COLUMNS: &str = "\
    id, conversation_id, sender_id, text, reply_to_message_id, \
    created_at, edited_at, deleted_at";

const ATTACHMENT_COLUMNS: &str = "\
    id, message_id, attachment_type, file_name, url, size_bytes, created_at";

/// Unread predicate shared by the count queries; `$1` conversation, `$2` reader.
const UNREAD_FILTER: &str = "\
    m.conversation_id = $1 AND m.sender_id <> $2 AND m.deleted_at IS NULL \
    AND NOT EXISTS (SELECT 1 FROM message_read_status r \
                    WHERE r.message_id = m.id AND r.user_id = $2)";

impl PgTransaction {
    /// Load attachments for `messages` in one round trip.
    async fn attach(&mut self, mut messages: Vec<Message>) -> RepoResult<Vec<Message>> {
        if messages.is_empty() {
            return Ok(messages);
        }
        let ids: Vec<DbId> = messages.iter().map(|m| m.id).collect();
        let query = format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM message_attachments \
             WHERE message_id = ANY($1) ORDER BY id"
        );
        let attachments = sqlx::query_as::<_, Attachment>(&query)
            .bind(&ids)
            .fetch_all(self.conn())
            .await?;

        let mut by_message: HashMap<DbId, Vec<Attachment>> = HashMap::new();
        for a in attachments {
            by_message.entry(a.message_id).or_default().push(a);
        }
        for m in &mut messages {
            m.attachments = by_message.remove(&m.id).unwrap_or_default();
        }
        Ok(messages)
    }

    async fn last_message(&mut self, conversation_id: DbId) -> RepoResult<Option<Message>> {
        let query = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE conversation_id = $1 AND deleted_at IS NULL \
             ORDER BY id DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, Message>(&query)
            .bind(conversation_id)
            .fetch_optional(self.conn())
            .await?;
        match row {
            Some(m) => Ok(self.attach(vec![m]).await?.pop()),
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversations
// ---------------------------------------------------------------------------

#[async_trait]
impl ConversationRepo for PgTransaction {
    async fn create_conversation(&mut self, coach_id: &str, client_id: &str) -> RepoResult<Conversation> {
        let query = format!(
            "INSERT INTO conversations (coach_id, client_id) VALUES ($1, $2) \
             RETURNING {CONVERSATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Conversation>(&query)
            .bind(coach_id)
            .bind(client_id)
            .fetch_one(self.conn())
            .await?;
        Ok(row)
    }

    async fn find_conversation_between(&mut self, a: &str, b: &str) -> RepoResult<Option<Conversation>> {
        let query = format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations \
             WHERE LEAST(coach_id, client_id) = LEAST($1, $2) \
               AND GREATEST(coach_id, client_id) = GREATEST($1, $2)"
        );
        let row = sqlx::query_as::<_, Conversation>(&query)
            .bind(a)
            .bind(b)
            .fetch_optional(self.conn())
            .await?;
        Ok(row)
    }

    async fn get_conversation(&mut self, id: DbId) -> RepoResult<Conversation> {
        let query = format!("SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = $1");
        sqlx::query_as::<_, Conversation>(&query)
            .bind(id)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("Conversation", id)
    }

    async fn list_conversations(
        &mut self,
        user_id: &str,
        include_archived: bool,
    ) -> RepoResult<Vec<ConversationSummary>> {
        let query = format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations \
             WHERE (coach_id = $1 OR client_id = $1) AND ($2 OR NOT archived) \
             ORDER BY COALESCE(last_message_at, created_at) DESC, id DESC"
        );
        let conversations = sqlx::query_as::<_, Conversation>(&query)
            .bind(user_id)
            .bind(include_archived)
            .fetch_all(self.conn())
            .await?;

        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let last_message = self.last_message(conversation.id).await?;
            let unread_count = self.unread_count(conversation.id, user_id).await?;
            summaries.push(ConversationSummary {
                conversation,
                last_message,
                unread_count,
            });
        }
        Ok(summaries)
    }

    async fn set_conversation_archived(&mut self, id: DbId, archived: bool) -> RepoResult<Conversation> {
        let query = format!(
            "UPDATE conversations SET archived = $2 WHERE id = $1 RETURNING {CONVERSATION_COLUMNS}"
        );
        sqlx::query_as::<_, Conversation>(&query)
            .bind(id)
            .bind(archived)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("Conversation", id)
    }

    async fn delete_conversation(&mut self, id: DbId) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(id)
            .execute(self.conn())
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("Conversation", id));
        }
        Ok(())
    }

    async fn is_participant(&mut self, conversation_id: DbId, user_id: &str) -> RepoResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM conversations \
             WHERE id = $1 AND (coach_id = $2 OR client_id = $2))",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(self.conn())
        .await?;
        Ok(exists)
    }
}

// ---------------------------------------------------------------------------
// Messages and read status
// ---------------------------------------------------------------------------

#[async_trait]
impl MessageRepo for PgTransaction {
    async fn insert_message(&mut self, input: &NewMessage) -> RepoResult<Message> {
        let query = format!(
            "INSERT INTO messages (conversation_id, sender_id, text, reply_to_message_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {MESSAGE_COLUMNS}"
        );
        let mut message = sqlx::query_as::<_, Message>(&query)
            .bind(input.conversation_id)
            .bind(&input.sender_id)
            .bind(&input.text)
            .bind(input.reply_to_message_id)
            .fetch_one(self.conn())
            .await?;

        let attachment_query = format!(
            "INSERT INTO message_attachments (message_id, attachment_type, file_name, url, size_bytes) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ATTACHMENT_COLUMNS}"
        );
        for a in &input.attachments {
            let attachment = sqlx::query_as::<_, Attachment>(&attachment_query)
                .bind(message.id)
                .bind(a.attachment_type.as_str())
                .bind(&a.file_name)
                .bind(&a.url)
                .bind(a.size_bytes)
                .fetch_one(self.conn())
                .await?;
            message.attachments.push(attachment);
        }

        sqlx::query("UPDATE conversations SET last_message_at = $2 WHERE id = $1")
            .bind(message.conversation_id)
            .bind(message.created_at)
            .execute(self.conn())
            .await?;

        Ok(message)
    }

    async fn get_message(&mut self, id: DbId) -> RepoResult<Message> {
        let query = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1");
        let message = sqlx::query_as::<_, Message>(&query)
            .bind(id)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("Message", id)?;
        self.attach(vec![message])
            .await?
            .pop()
            .or_not_found("Message", id)
    }

    async fn list_messages(
        &mut self,
        conversation_id: DbId,
        before_id: Option<DbId>,
        limit: i64,
    ) -> RepoResult<Vec<Message>> {
        let query = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE conversation_id = $1 AND deleted_at IS NULL \
               AND ($2::BIGINT IS NULL OR id < $2) \
             ORDER BY id DESC LIMIT $3"
        );
        let rows = sqlx::query_as::<_, Message>(&query)
            .bind(conversation_id)
            .bind(before_id)
            .bind(limit)
            .fetch_all(self.conn())
            .await?;
        self.attach(rows).await
    }

    async fn update_message_text(&mut self, id: DbId, text: &str) -> RepoResult<Message> {
        let query = format!(
            "UPDATE messages SET text = $2, edited_at = NOW() \
             WHERE id = $1 RETURNING {MESSAGE_COLUMNS}"
        );
        let message = sqlx::query_as::<_, Message>(&query)
            .bind(id)
            .bind(text)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("Message", id)?;
        self.attach(vec![message])
            .await?
            .pop()
            .or_not_found("Message", id)
    }

    async fn soft_delete_message(&mut self, id: DbId) -> RepoResult<Message> {
        let query = format!(
            "UPDATE messages SET deleted_at = COALESCE(deleted_at, NOW()) \
             WHERE id = $1 RETURNING {MESSAGE_COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(id)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("Message", id)
    }

    async fn mark_read(&mut self, message_id: DbId, user_id: &str) -> RepoResult<bool> {
        let result = sqlx::query(
            "INSERT INTO message_read_status (message_id, user_id) VALUES ($1, $2) \
             ON CONFLICT (message_id, user_id) DO NOTHING",
        )
        .bind(message_id)
        .bind(user_id)
        .execute(self.conn())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_conversation_read(&mut self, conversation_id: DbId, user_id: &str) -> RepoResult<Vec<DbId>> {
        let query = format!(
            "INSERT INTO message_read_status (message_id, user_id) \
             SELECT m.id, $2 FROM messages m WHERE {UNREAD_FILTER} \
             ON CONFLICT (message_id, user_id) DO NOTHING \
             RETURNING message_id"
        );
        let mut ids = sqlx::query_scalar::<_, DbId>(&query)
            .bind(conversation_id)
            .bind(user_id)
            .fetch_all(self.conn())
            .await?;
        ids.sort_unstable();
        Ok(ids)
    }

    async fn unread_count(&mut self, conversation_id: DbId, user_id: &str) -> RepoResult<i64> {
        let query = format!("SELECT COUNT(*) FROM messages m WHERE {UNREAD_FILTER}");
        let count = sqlx::query_scalar::<_, i64>(&query)
            .bind(conversation_id)
            .bind(user_id)
            .fetch_one(self.conn())
            .await?;
        Ok(count)
    }
}
