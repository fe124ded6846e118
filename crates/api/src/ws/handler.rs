use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use chrono::Utc;
use fitup_core::error::CoreError;
use fitup_core::messaging::{error_code, parse_client_frame, ClientAction, HubEvent, HubEventType};
use fitup_core::types::UserId;
use fitup_events::hub::Registration;
use fitup_events::HubFrame;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{bearer_token, AuthUser};
use crate::state::AppState;

/// A connection that sends nothing (not even a pong) for this long is dropped.
pub const READ_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Browsers cannot set headers on the upgrade request.
    pub token: Option<String>,
}

/// GET /ws -- authenticate, then upgrade to a realtime connection.
///
/// The token comes from the `Authorization` header or the `token` query
/// parameter.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let token = match bearer_token(&headers)? {
        Some(token) => token.to_string(),
        None => params
            .token
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Missing access token".into())))?,
    };
    let auth = AuthUser::from_token(&token, &state)?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, auth.user_id)))
}

/// Manage a single WebSocket connection after upgrade.
///
///   1. Registers the user with the hub (evicting any previous socket).
///   2. Spawns a writer task that drains the hub queue into the sink.
///   3. Handles client frames on the current task until close or timeout.
///   4. Unregisters this connection.
async fn handle_socket(mut socket: WebSocket, state: AppState, user_id: UserId) {
    let Registration {
        connection_id,
        mut receiver,
    } = match state.hub.connect(&user_id).await {
        Ok(registration) => registration,
        Err(e) => {
            tracing::info!(user_id = %user_id, error = %e, "Refusing WebSocket connection");
            let _ = socket.send(close_message(close_code::AWAY, "shutdown")).await;
            return;
        }
    };
    tracing::info!(user_id = %user_id, %connection_id, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();

    let writer_user = user_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = receiver.recv().await {
            let (message, last) = match frame {
                HubFrame::Text(text) => (Message::Text(text.into()), false),
                HubFrame::Ping => (Message::Ping(Bytes::new()), false),
                HubFrame::Close(reason) => (close_message(close_code::NORMAL, &reason), true),
            };
            if sink.send(message).await.is_err() {
                tracing::debug!(user_id = %writer_user, "WebSocket sink closed");
                break;
            }
            if last {
                break;
            }
        }
    });

    loop {
        let next = tokio::select! {
            // Writer finished: replaced, shut down, or the sink broke.
            _ = &mut send_task => break,
            next = tokio::time::timeout(READ_TIMEOUT, stream.next()) => next,
        };

        match next {
            Err(_) => {
                tracing::info!(user_id = %user_id, "WebSocket read timeout");
                break;
            }
            Ok(None) | Ok(Some(Ok(Message::Close(_)))) => break,
            Ok(Some(Err(e))) => {
                tracing::debug!(user_id = %user_id, error = %e, "WebSocket receive error");
                break;
            }
            Ok(Some(Ok(Message::Text(text)))) => handle_client_frame(&state, &user_id, text.as_str()).await,
            Ok(Some(Ok(Message::Binary(_)))) => {
                send_error(&state, &user_id, error_code::BAD_FRAME, "binary frames are not supported").await;
            }
            Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => {
                tracing::trace!(user_id = %user_id, "Keepalive received");
            }
        }
    }

    state.hub.disconnect_connection(&user_id, connection_id).await;
    send_task.abort();
    tracing::info!(user_id = %user_id, %connection_id, "WebSocket disconnected");
}

/// Dispatch one `{action, channel}` envelope from the client.
async fn handle_client_frame(state: &AppState, user_id: &str, text: &str) {
    let envelope = match parse_client_frame(text) {
        Ok(envelope) => envelope,
        Err((code, message)) => {
            send_error(state, user_id, code, message).await;
            return;
        }
    };
    let channel = envelope.channel.unwrap_or_default();

    let (result, event_type) = match envelope.action {
        ClientAction::Ping => {
            tracing::trace!(user_id, "Client ping");
            return;
        }
        ClientAction::Subscribe => (
            state.services.messaging.subscribe(user_id, &channel).await,
            HubEventType::Subscribed,
        ),
        ClientAction::Unsubscribe => (
            state.services.messaging.unsubscribe(user_id, &channel).await,
            HubEventType::Unsubscribed,
        ),
    };

    match result {
        Ok(conversation_id) => {
            let ack = HubEvent::subscription(event_type, conversation_id, Utc::now());
            state.hub.send_to_user(user_id, &ack).await;
        }
        Err(err) => {
            let code = match &err {
                CoreError::Validation(_) => error_code::INVALID_CHANNEL,
                CoreError::Forbidden(_) | CoreError::NotFound { .. } => error_code::NOT_PARTICIPANT,
                _ => error_code::INTERNAL,
            };
            tracing::debug!(user_id, channel = %channel, error = %err, "Rejected channel request");
            send_error(state, user_id, code, err.to_string()).await;
        }
    }
}

async fn send_error(state: &AppState, user_id: &str, code: &str, message: impl Into<String>) {
    let event = HubEvent::error(code, message, Utc::now());
    state.hub.send_to_user(user_id, &event).await;
}

fn close_message(code: u16, reason: &str) -> Message {
    Message::Close(Some(CloseFrame {
        code,
        reason: reason.into(),
    }))
}
