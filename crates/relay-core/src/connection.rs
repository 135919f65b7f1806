//! Connection handles.
//!
//! The relay never owns a socket. It holds a handle implementing
//! [`Connection`]; the transport layer decides when the socket lives and
//! dies and tells the relay through `on_close` / `on_error`.

use std::fmt;

use thiserror::Error;

/// Identifier for an accepted connection.
///
/// Unique for the lifetime of the process. Cleanup is keyed on this, never
/// on the user id a connection claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a fire-and-forget send did not go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("connection is closed")]
    Closed,

    #[error("outbound buffer is full")]
    Full,
}

/// A live bidirectional channel to one client.
pub trait Connection {
    fn id(&self) -> ConnectionId;

    /// Whether the channel can still accept writes.
    fn is_open(&self) -> bool;

    /// Queue one text frame. Must not block.
    fn send(&self, text: String) -> Result<(), SendError>;
}
