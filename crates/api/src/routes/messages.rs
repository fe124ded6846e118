//! Route definitions for messaging.
//!
//! Registered under `/messages`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::messages;
use crate::state::AppState;

/// Messaging routes, registered as `/messages`.
///
/// ```text
/// POST   /                                  send_message
/// GET    /conversations                     list_conversations
/// POST   /conversations                     create_conversation
/// GET    /conversations/{id}/messages       list_messages
/// POST   /conversations/{id}/read           mark_conversation_read
/// POST   /conversations/{id}/archive        archive_conversation
/// PUT    /{id}                              edit_message
/// DELETE /{id}                              delete_message
/// POST   /{id}/read                         mark_read
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(messages::send_message))
        .route(
            "/conversations",
            get(messages::list_conversations).post(messages::create_conversation),
        )
        .route("/conversations/{id}/messages", get(messages::list_messages))
        .route("/conversations/{id}/read", post(messages::mark_conversation_read))
        .route("/conversations/{id}/archive", post(messages::archive_conversation))
        .route("/{id}", put(messages::edit_message).delete(messages::delete_message))
        .route("/{id}/read", post(messages::mark_read))
}
