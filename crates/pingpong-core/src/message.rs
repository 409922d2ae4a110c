//! Heartbeat wire message types.
//!
//! Both directions use UTF-8 JSON text frames with a literal `type` tag.
//! The client sends pings; the server echoes the ping's `timestamp` back in
//! the pong, so round-trip latency can be computed locally without trusting
//! the server clock.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Outgoing ping message.
///
/// Wire form: `{"type":"ping","userId":...,"timestamp":...,"sessionId":...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingMessage {
    /// Message type, always "ping".
    #[serde(rename = "type")]
    pub message_type: String,
    /// User the heartbeat belongs to.
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Send time (Unix epoch ms). Echoed back by the server.
    pub timestamp: i64,
    /// Session token for server-side correlation. Omitted when absent.
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl PingMessage {
    /// Build a ping stamped with the given send time.
    pub fn new(user_id: impl Into<String>, timestamp: i64, session_id: Option<String>) -> Self {
        Self {
            message_type: "ping".to_string(),
            user_id: user_id.into(),
            timestamp,
            session_id,
        }
    }
}

/// Incoming pong message.
///
/// `timestamp` is the original ping send time, echoed back. `response_time`
/// is a server-side measurement; informational only, latency is always
/// computed locally from the timestamp echo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PongMessage {
    /// Message type, always "pong".
    #[serde(rename = "type")]
    pub message_type: String,
    /// User the heartbeat belongs to.
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Echoed ping send time (Unix epoch ms).
    pub timestamp: i64,
    /// Session token, if the server echoes it.
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Server-measured response time (ms), if provided.
    #[serde(rename = "responseTime", skip_serializing_if = "Option::is_none")]
    pub response_time: Option<i64>,
}

/// A parsed inbound text frame.
#[derive(Debug, Clone)]
pub enum Frame {
    /// Pong answering one of our pings.
    Pong(PongMessage),
    /// Server-initiated ping. Carries no liveness semantics for this client.
    Ping(PingMessage),
    /// Valid JSON with a `type` we do not handle.
    Unrecognized(String),
}

/// Parse an inbound text frame.
///
/// Malformed JSON, a missing/non-string `type` field, or a ping/pong frame
/// with invalid fields all yield `CoreError::MalformedFrame`. Frames with an
/// unknown `type` parse to `Frame::Unrecognized` so callers can log and drop
/// them without treating them as errors.
pub fn parse_frame(text: &str) -> Result<Frame> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| CoreError::MalformedFrame(e.to_string()))?;

    let message_type = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CoreError::MalformedFrame("missing \"type\" field".to_string()))?
        .to_string();

    match message_type.as_str() {
        "pong" => serde_json::from_value(value)
            .map(Frame::Pong)
            .map_err(|e| CoreError::MalformedFrame(e.to_string())),
        "ping" => serde_json::from_value(value)
            .map(Frame::Ping)
            .map_err(|e| CoreError::MalformedFrame(e.to_string())),
        _ => Ok(Frame::Unrecognized(message_type)),
    }
}
