//! JSON codec.
//!
//! Input format (text frame → `InboundFrame`):
//!
//! - Connect:
//!   `{"type":"connect","userId":"u1"}`
//!
//! - Chat:
//!   `{"type":"chat","payload":{"receiverId":"u2","message":<any>}}`
//!
//! Output format (relay → recipient):
//!
//! - the `message` value alone, re-encoded as JSON text.
//!
//! Presence checks follow the browser client's truthiness rules: `null`,
//! `false`, `0` and `""` count as absent.

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::frames::{IgnoreReason, InboundFrame};

/// Errors from decoding a raw frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("frame is not a JSON object")]
    NotAnObject,

    #[error("binary frame is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// Envelope fields as they arrive. Everything is optional; shape checks
/// happen after parsing so that incomplete frames are ignored rather than
/// reported as malformed.
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type", default)]
    kind: Option<Value>,
    #[serde(rename = "userId", default)]
    user_id: Option<Value>,
    #[serde(default)]
    payload: Option<Value>,
}

/// Parse a single text frame into an `InboundFrame`.
pub fn decode_frame(text: &str) -> Result<InboundFrame, ProtocolError> {
    let value: Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(ProtocolError::NotAnObject);
    }

    let raw: RawFrame = serde_json::from_value(value)?;

    let frame = match raw.kind.as_ref().and_then(Value::as_str) {
        Some("connect") => parse_connect(raw.user_id),
        Some("chat") => parse_chat(raw.payload),
        Some(other) => InboundFrame::Ignored(IgnoreReason::UnknownType(Some(other.to_string()))),
        None => InboundFrame::Ignored(IgnoreReason::UnknownType(None)),
    };

    Ok(frame)
}

/// Binary frames are read as UTF-8 JSON text.
pub fn decode_binary_frame(bytes: &[u8]) -> Result<InboundFrame, ProtocolError> {
    let text = std::str::from_utf8(bytes)?;
    decode_frame(text)
}

/// Re-encode a forwarded `message` for the recipient.
pub fn encode_outbound(message: &Value) -> String {
    // Serializing a `Value` to a string cannot fail.
    message.to_string()
}

/// Build a `connect` frame.
pub fn encode_connect(user_id: &str) -> String {
    json!({ "type": "connect", "userId": user_id }).to_string()
}

/// Build a `chat` frame.
pub fn encode_chat(receiver_id: &str, message: &Value) -> String {
    json!({
        "type": "chat",
        "payload": { "receiverId": receiver_id, "message": message },
    })
    .to_string()
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn parse_connect(user_id: Option<Value>) -> InboundFrame {
    match non_empty_string(user_id.as_ref()) {
        Some(user_id) => InboundFrame::Connect { user_id },
        None => InboundFrame::Ignored(IgnoreReason::MissingUserId),
    }
}

fn parse_chat(payload: Option<Value>) -> InboundFrame {
    let Some(Value::Object(mut payload)) = payload else {
        return InboundFrame::Ignored(IgnoreReason::IncompleteChat);
    };

    let receiver_id = non_empty_string(payload.get("receiverId"));
    let message = payload.remove("message").filter(is_truthy);

    match (receiver_id, message) {
        (Some(receiver_id), Some(message)) => InboundFrame::Chat {
            receiver_id,
            message,
        },
        _ => InboundFrame::Ignored(IgnoreReason::IncompleteChat),
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
