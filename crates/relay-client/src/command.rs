// crates/relay-client/src/command.rs

use serde_json::Value;

/// One line typed by the user: `<receiverId> <message>`.
#[derive(Debug, PartialEq)]
pub struct ChatCommand {
    pub receiver_id: String,
    pub message: Value,
}

/// Parse an input line. The message part is sent as JSON when it parses
/// as JSON, otherwise as a plain string.
pub fn parse_line(line: &str) -> Option<ChatCommand> {
    let (receiver_id, rest) = line.trim().split_once(char::is_whitespace)?;
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }

    let message = serde_json::from_str(rest).unwrap_or_else(|_| Value::String(rest.to_string()));

    Some(ChatCommand {
        receiver_id: receiver_id.to_string(),
        message,
    })
}
