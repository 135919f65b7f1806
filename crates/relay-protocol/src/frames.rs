//! Logical frames a client can send to the relay.

use serde_json::Value;

/// A decoded client → relay frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// `{ "type": "connect", "userId": "..." }`
    Connect { user_id: String },

    /// `{ "type": "chat", "payload": { "receiverId": "...", "message": <any> } }`
    ///
    /// `message` is opaque to the relay and forwarded as-is.
    Chat { receiver_id: String, message: Value },

    /// Well-formed JSON the relay has no use for.
    Ignored(IgnoreReason),
}

/// Why a well-formed frame was ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// `type` was absent or not one the relay knows.
    UnknownType(Option<String>),

    /// A `connect` frame without a usable `userId`.
    MissingUserId,

    /// A `chat` frame without a usable `receiverId` or `message`.
    IncompleteChat,
}

impl InboundFrame {
    /// Short label for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundFrame::Connect { .. } => "connect",
            InboundFrame::Chat { .. } => "chat",
            InboundFrame::Ignored(_) => "ignored",
        }
    }
}
