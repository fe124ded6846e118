//! Conversations, messages, attachments and read status.

use serde::Serialize;
use sqlx::FromRow;
use fitup_core::messaging::{AttachmentInput, AttachmentType};
use fitup_core::types::{DbId, Timestamp, UserId};

/// A row from the `conversations` table. The `(coach, client)` pair is
/// unique in either order.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Conversation {
    pub id: DbId,
    pub coach_id: UserId,
    pub client_id: UserId,
    pub created_at: Timestamp,
    pub archived: bool,
    pub last_message_at: Option<Timestamp>,
}

impl Conversation {
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.coach_id == user_id || self.client_id == user_id
    }

    /// The participant that is not `user_id`.
    pub fn other_participant(&self, user_id: &str) -> &str {
        if self.coach_id == user_id {
            &self.client_id
        } else {
            &self.coach_id
        }
    }
}

/// Conversation list entry for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub last_message: Option<Message>,
    pub unread_count: i64,
}

/// A row from the `messages` table with its attachments.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Message {
    pub id: DbId,
    pub conversation_id: DbId,
    pub sender_id: UserId,
    pub text: String,
    pub reply_to_message_id: Option<DbId>,
    pub created_at: Timestamp,
    pub edited_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
    #[sqlx(skip)]
    pub attachments: Vec<Attachment>,
}

/// A row from the `message_attachments` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Attachment {
    pub id: DbId,
    pub message_id: DbId,
    #[sqlx(try_from = "String")]
    pub attachment_type: AttachmentType,
    pub file_name: String,
    pub url: String,
    pub size_bytes: Option<i64>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub conversation_id: DbId,
    pub sender_id: UserId,
    pub text: String,
    pub reply_to_message_id: Option<DbId>,
    pub attachments: Vec<AttachmentInput>,
}

/// A row from the `message_read_status` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ReadStatus {
    pub message_id: DbId,
    pub user_id: UserId,
    pub read_at: Timestamp,
}
