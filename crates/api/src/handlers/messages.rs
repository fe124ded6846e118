//! Handlers for coach/client conversations and messages.
//!
//! Every write also fans out over the realtime hub; see `fitup_services::messaging`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use fitup_core::types::{DbId, UserId};
use fitup_services::messaging::SendMessage;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/* --------------------------------------------------------------------------
Request / response types
-------------------------------------------------------------------------- */

#[derive(Debug, Deserialize)]
pub struct ListConversationsParams {
    #[serde(default)]
    pub include_archived: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateConversationBody {
    /// The other participant.
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesParams {
    /// Return messages older than this id.
    pub before_id: Option<DbId>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct EditBody {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ArchiveBody {
    #[serde(default = "default_archived")]
    pub archived: bool,
}

fn default_archived() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct ReadReceipt {
    /// False when the message was already read, deleted, or the caller's own.
    pub marked: bool,
}

#[derive(Debug, Serialize)]
pub struct ConversationReadReceipt {
    pub marked_message_ids: Vec<DbId>,
}

/* --------------------------------------------------------------------------
Conversations
-------------------------------------------------------------------------- */

/// GET /messages/conversations
pub async fn list_conversations(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListConversationsParams>,
) -> AppResult<impl IntoResponse> {
    let conversations = state
        .services
        .messaging
        .list_conversations(&auth.actor(), params.include_archived)
        .await?;
    Ok(Json(DataResponse::new(conversations)))
}

/// POST /messages/conversations
///
/// Returns the existing conversation when the pair already has one.
pub async fn create_conversation(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateConversationBody>,
) -> AppResult<impl IntoResponse> {
    let conversation = state
        .services
        .messaging
        .create_conversation(&auth.actor(), &body.user_id)
        .await?;
    Ok(Json(DataResponse::new(conversation)))
}

/// GET /messages/conversations/{id}/messages
pub async fn list_messages(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<DbId>,
    Query(params): Query<ListMessagesParams>,
) -> AppResult<impl IntoResponse> {
    let messages = state
        .services
        .messaging
        .list_messages(&auth.actor(), conversation_id, params.before_id, params.limit)
        .await?;
    Ok(Json(DataResponse::new(messages)))
}

/// POST /messages/conversations/{id}/read
pub async fn mark_conversation_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let marked_message_ids = state
        .services
        .messaging
        .mark_conversation_read(&auth.actor(), conversation_id)
        .await?;
    Ok(Json(DataResponse::new(ConversationReadReceipt { marked_message_ids })))
}

/// POST /messages/conversations/{id}/archive
pub async fn archive_conversation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<DbId>,
    Json(body): Json<ArchiveBody>,
) -> AppResult<impl IntoResponse> {
    let conversation = state
        .services
        .messaging
        .archive(&auth.actor(), conversation_id, body.archived)
        .await?;
    Ok(Json(DataResponse::new(conversation)))
}

/* --------------------------------------------------------------------------
Messages
-------------------------------------------------------------------------- */

/// POST /messages
pub async fn send_message(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SendMessage>,
) -> AppResult<impl IntoResponse> {
    let message = state.services.messaging.send(&auth.actor(), input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(message))))
}

/// PUT /messages/{id}
pub async fn edit_message(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<DbId>,
    Json(body): Json<EditBody>,
) -> AppResult<impl IntoResponse> {
    let message = state
        .services
        .messaging
        .edit(&auth.actor(), message_id, &body.text)
        .await?;
    Ok(Json(DataResponse::new(message)))
}

/// DELETE /messages/{id}
pub async fn delete_message(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.services.messaging.delete(&auth.actor(), message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /messages/{id}/read
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let marked = state.services.messaging.mark_read(&auth.actor(), message_id).await?;
    Ok(Json(DataResponse::new(ReadReceipt { marked })))
}
