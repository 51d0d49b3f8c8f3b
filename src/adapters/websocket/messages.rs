//! WebSocket message types for the push channel.
//!
//! Every frame is a JSON object `{"type": <name>, "data": <payload>}`:
//! - Server → Client: Acks, pongs, broadcast events, errors
//! - Client → Server: Event logging, dashboard join/leave, pings

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::events::Event;
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Result of a `log_event` request.
    EventLogged(EventLoggedMessage),

    /// The channel now receives `new_event` broadcasts.
    DashboardJoined(AckMessage),

    /// The channel no longer receives broadcasts.
    DashboardLeft(AckMessage),

    /// Heartbeat response.
    Pong(PongMessage),

    /// An event read back from the topic.
    NewEvent(Event),

    /// A frame could not be understood.
    Error(ErrorMessage),
}

/// Ack for an event sent over the push channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventLoggedMessage {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EventLoggedMessage {
    pub fn logged(event_type: impl Into<String>) -> Self {
        Self {
            success: true,
            event_type: Some(event_type.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            event_type: None,
            error: Some(error.into()),
        }
    }
}

/// Plain success ack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AckMessage {
    pub success: bool,
}

impl AckMessage {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Error message sent to client.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorMessage {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            timestamp: Timestamp::now().to_iso_string(),
        }
    }
}

impl From<DomainError> for ErrorMessage {
    fn from(err: DomainError) -> Self {
        Self::new(err.code, err.message)
    }
}

/// Heartbeat response.
#[derive(Debug, Clone, Serialize)]
pub struct PongMessage {
    pub timestamp: String,
}

impl PongMessage {
    pub fn now() -> Self {
        Self {
            timestamp: Timestamp::now().to_iso_string(),
        }
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Raw event payload, normalized by the ingestion handler.
    LogEvent(Value),
    JoinDashboard,
    LeaveDashboard,
    Ping,
}

/// Why a client frame was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("Frame is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Unknown message type: {0}")]
    UnknownType(String),
}

/// Wire shape of a client frame. `data` may be omitted for messages
/// that carry no payload.
#[derive(Deserialize)]
struct Frame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl FromStr for ClientMessage {
    type Err = FrameError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let frame: Frame =
            serde_json::from_str(text).map_err(|e| FrameError::InvalidJson(e.to_string()))?;

        match frame.kind.as_str() {
            "log_event" => Ok(ClientMessage::LogEvent(frame.data)),
            "join_dashboard" => Ok(ClientMessage::JoinDashboard),
            "leave_dashboard" => Ok(ClientMessage::LeaveDashboard),
            "ping" => Ok(ClientMessage::Ping),
            _ => Err(FrameError::UnknownType(frame.kind)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::EventType;
    use serde_json::json;

    #[test]
    fn server_message_serializes_with_type_and_data() {
        let msg = ServerMessage::DashboardJoined(AckMessage::ok());

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, json!({"type": "dashboard_joined", "data": {"success": true}}));
    }

    #[test]
    fn event_logged_success_omits_error() {
        let msg = ServerMessage::EventLogged(EventLoggedMessage::logged("play"));

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            json!({"type": "event_logged", "data": {"success": true, "event_type": "play"}})
        );
    }

    #[test]
    fn event_logged_failure_carries_error() {
        let msg = ServerMessage::EventLogged(EventLoggedMessage::failed("Field 'event_type' is required"));

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["data"]["success"], json!(false));
        assert_eq!(json["data"]["error"], json!("Field 'event_type' is required"));
        assert!(json["data"].get("event_type").is_none());
    }

    #[test]
    fn new_event_carries_canonical_event() {
        let event = Event::new(EventType::Play, "t1").with_user_id("u1");
        let msg = ServerMessage::NewEvent(event);

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], json!("new_event"));
        assert_eq!(json["data"]["event_type"], json!("play"));
        assert_eq!(json["data"]["user_id"], json!("u1"));
        assert_eq!(json["data"]["track_id"], json!("t1"));
    }

    #[test]
    fn error_message_serializes_correctly() {
        let msg = ServerMessage::Error(ErrorMessage::new(
            ErrorCode::InvalidMessage,
            "Unknown message type: shout",
        ));

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"error""#));
        assert!(json.contains(r#""code":"INVALID_MESSAGE""#));
    }

    #[test]
    fn client_message_parses_log_event_payload() {
        let msg: ClientMessage =
            r#"{"type": "log_event", "data": {"eventType": "play", "trackId": "t1"}}"#
                .parse()
                .unwrap();

        assert_eq!(
            msg,
            ClientMessage::LogEvent(json!({"eventType": "play", "trackId": "t1"}))
        );
    }

    #[test]
    fn client_message_parses_without_data() {
        assert_eq!(
            r#"{"type": "join_dashboard"}"#.parse::<ClientMessage>().unwrap(),
            ClientMessage::JoinDashboard
        );
        assert_eq!(
            r#"{"type": "leave_dashboard", "data": null}"#
                .parse::<ClientMessage>()
                .unwrap(),
            ClientMessage::LeaveDashboard
        );
        assert_eq!(
            r#"{"type": "ping", "data": {}}"#.parse::<ClientMessage>().unwrap(),
            ClientMessage::Ping
        );
    }

    #[test]
    fn client_message_rejects_unknown_type() {
        let err = r#"{"type": "shout"}"#.parse::<ClientMessage>().unwrap_err();
        assert_eq!(err, FrameError::UnknownType("shout".into()));
    }

    #[test]
    fn client_message_rejects_invalid_json() {
        let err = "not json".parse::<ClientMessage>().unwrap_err();
        assert!(matches!(err, FrameError::InvalidJson(_)));
    }
}
