//! Messaging vocabulary: channel names, message validation and the
//! versioned realtime event schema.

use serde::{Deserialize, Serialize};

use crate::enums::define_text_enum;
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};
use crate::validation::{validate_id, validate_required, validate_text_length};

pub const MIN_MESSAGE_LEN: usize = 1;
pub const MAX_MESSAGE_LEN: usize = 5000;
pub const MAX_FILE_NAME_LEN: usize = 255;
pub const MAX_URL_LEN: usize = 2048;

/// Realtime event schema version.
pub const EVENT_SCHEMA_VERSION: u8 = 1;

const CHANNEL_PREFIX: &str = "conversation:";

/// Hub channel for a conversation.
pub fn conversation_channel(conversation_id: DbId) -> String {
    format!("{CHANNEL_PREFIX}{conversation_id}")
}

/// Parse `conversation:{id}` back to the id.
pub fn parse_channel(channel: &str) -> Result<DbId, CoreError> {
    channel
        .strip_prefix(CHANNEL_PREFIX)
        .and_then(|id| id.parse::<DbId>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| CoreError::Validation(format!("invalid channel: '{channel}'")))
}

/// 1 to 5000 characters. Whitespace counts.
pub fn validate_message_text(text: &str) -> Result<(), CoreError> {
    validate_text_length(text, MIN_MESSAGE_LEN, MAX_MESSAGE_LEN, "message text")
}

define_text_enum! {
    AttachmentType("attachment type") {
        Image = "image",
        Document = "document",
    }
}

/// An attachment as submitted with a new message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentInput {
    pub attachment_type: AttachmentType,
    pub file_name: String,
    pub url: String,
    #[serde(default)]
    pub size_bytes: Option<i64>,
}

impl AttachmentInput {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_required(&self.file_name, "file name")?;
        validate_text_length(&self.file_name, 1, MAX_FILE_NAME_LEN, "file name")?;
        validate_required(&self.url, "url")?;
        validate_text_length(&self.url, 1, MAX_URL_LEN, "url")?;
        if self.size_bytes.is_some_and(|s| s < 0) {
            return Err(CoreError::Validation("size must not be negative".into()));
        }
        Ok(())
    }
}

pub fn validate_conversation_id(id: DbId) -> Result<(), CoreError> {
    validate_id(id, "conversation id")
}

// ---------------------------------------------------------------------------
// Realtime events (schema v1)
// ---------------------------------------------------------------------------

define_text_enum! {
    HubEventType("event type") {
        NewMessage = "new_message",
        MessageEdited = "message_edited",
        MessageDeleted = "message_deleted",
        MessageRead = "message_read",
        Subscribed = "subscribed",
        Unsubscribed = "unsubscribed",
        Error = "error",
    }
}

/// Server-to-client event frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubEvent {
    pub version: u8,
    #[serde(rename = "type")]
    pub event_type: HubEventType,
    #[serde(rename = "conversationID", skip_serializing_if = "Option::is_none", default)]
    pub conversation_id: Option<DbId>,
    #[serde(rename = "messageID", skip_serializing_if = "Option::is_none", default)]
    pub message_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<serde_json::Value>,
    #[serde(rename = "readBy", skip_serializing_if = "Option::is_none", default)]
    pub read_by: Option<String>,
    pub timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<HubError>,
}

/// Short machine code plus human message for `error` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubError {
    pub code: String,
    pub message: String,
}

impl HubEvent {
    fn base(event_type: HubEventType, conversation_id: Option<DbId>, timestamp: Timestamp) -> Self {
        Self {
            version: EVENT_SCHEMA_VERSION,
            event_type,
            conversation_id,
            message_id: None,
            message: None,
            read_by: None,
            timestamp,
            error: None,
        }
    }

    /// A message lifecycle event carrying the stored message.
    pub fn message(
        event_type: HubEventType,
        conversation_id: DbId,
        message_id: DbId,
        message: Option<serde_json::Value>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            message_id: Some(message_id),
            message,
            ..Self::base(event_type, Some(conversation_id), timestamp)
        }
    }

    pub fn read(conversation_id: DbId, message_id: DbId, read_by: &str, timestamp: Timestamp) -> Self {
        Self {
            message_id: Some(message_id),
            read_by: Some(read_by.to_string()),
            ..Self::base(HubEventType::MessageRead, Some(conversation_id), timestamp)
        }
    }

    pub fn subscription(event_type: HubEventType, conversation_id: DbId, timestamp: Timestamp) -> Self {
        Self::base(event_type, Some(conversation_id), timestamp)
    }

    pub fn error(code: &str, message: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            error: Some(HubError {
                code: code.to_string(),
                message: message.into(),
            }),
            ..Self::base(HubEventType::Error, None, timestamp)
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"version":{EVENT_SCHEMA_VERSION},"type":"error","error":{{"code":"encode_failed","message":"event encoding failed"}}}}"#)
        })
    }
}

/// Error codes delivered in `error` events.
pub mod error_code {
    pub const BAD_FRAME: &str = "bad_frame";
    pub const UNKNOWN_ACTION: &str = "unknown_action";
    pub const INVALID_CHANNEL: &str = "invalid_channel";
    pub const NOT_PARTICIPANT: &str = "not_participant";
    pub const INTERNAL: &str = "internal";
}

define_text_enum! {
    ClientAction("client action") {
        Subscribe = "subscribe",
        Unsubscribe = "unsubscribe",
        Ping = "ping",
    }
}

/// Client-to-server envelope `{action, channel}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientEnvelope {
    pub action: ClientAction,
    pub channel: Option<String>,
}

#[derive(Deserialize)]
struct RawEnvelope {
    action: String,
    #[serde(default)]
    channel: Option<String>,
}

/// Parse a client text frame. The `Err` carries the error code to report.
pub fn parse_client_frame(text: &str) -> Result<ClientEnvelope, (&'static str, String)> {
    let raw: RawEnvelope = serde_json::from_str(text)
        .map_err(|e| (error_code::BAD_FRAME, format!("malformed frame: {e}")))?;
    let action: ClientAction = raw
        .action
        .parse()
        .map_err(|_| (error_code::UNKNOWN_ACTION, format!("unknown action '{}'", raw.action)))?;
    if matches!(action, ClientAction::Subscribe | ClientAction::Unsubscribe) && raw.channel.is_none() {
        return Err((error_code::INVALID_CHANNEL, format!("{action} requires a channel")));
    }
    Ok(ClientEnvelope {
        action,
        channel: raw.channel,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    #[test]
    fn channel_names_round_trip() {
        assert_eq!(conversation_channel(42), "conversation:42");
        assert_eq!(parse_channel("conversation:42").unwrap(), 42);
        assert!(parse_channel("conversation:0").is_err());
        assert!(parse_channel("room:42").is_err());
        assert!(parse_channel("conversation:abc").is_err());
    }

    #[test]
    fn message_length_bounds() {
        assert!(validate_message_text("hi").is_ok());
        assert!(validate_message_text("").is_err());
        assert!(validate_message_text(" ").is_ok());
        assert!(validate_message_text(&"a".repeat(5000)).is_ok());
        assert!(validate_message_text(&"a".repeat(5001)).is_err());
        // Length counts characters, not bytes.
        assert!(validate_message_text(&"é".repeat(5000)).is_ok());
    }

    #[test]
    fn attachment_validation() {
        let ok = AttachmentInput {
            attachment_type: AttachmentType::Image,
            file_name: "form.jpg".into(),
            url: "https://cdn.example.com/form.jpg".into(),
            size_bytes: Some(1024),
        };
        assert!(ok.validate().is_ok());
        assert!(AttachmentInput { file_name: " ".into(), ..ok.clone() }.validate().is_err());
        assert!(AttachmentInput { url: String::new(), ..ok }.validate().is_err());
        assert!("video".parse::<AttachmentType>().is_err());
    }

    #[test]
    fn event_payload_uses_v1_keys() {
        let event = HubEvent::message(
            HubEventType::NewMessage,
            7,
            99,
            Some(serde_json::json!({"text": "hi"})),
            now(),
        );
        let json: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["type"], "new_message");
        assert_eq!(json["conversationID"], 7);
        assert_eq!(json["messageID"], 99);
        assert_eq!(json["message"]["text"], "hi");
        assert!(json.get("readBy").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn read_event_carries_reader() {
        let json: serde_json::Value = serde_json::from_str(&HubEvent::read(7, 99, "user-1", now()).to_json()).unwrap();
        assert_eq!(json["type"], "message_read");
        assert_eq!(json["readBy"], "user-1");
    }

    #[test]
    fn client_frames() {
        let env = parse_client_frame(r#"{"action":"subscribe","channel":"conversation:3"}"#).unwrap();
        assert_eq!(env.action, ClientAction::Subscribe);
        assert_eq!(env.channel.as_deref(), Some("conversation:3"));

        assert_eq!(parse_client_frame(r#"{"action":"ping"}"#).unwrap().action, ClientAction::Ping);
        assert_eq!(parse_client_frame(r#"{"action":"dance"}"#).unwrap_err().0, error_code::UNKNOWN_ACTION);
        assert_eq!(parse_client_frame("not json").unwrap_err().0, error_code::BAD_FRAME);
        assert_eq!(parse_client_frame(r#"{"action":"subscribe"}"#).unwrap_err().0, error_code::INVALID_CHANNEL);
    }
}
