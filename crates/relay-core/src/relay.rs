//! Relay dispatcher.
//!
//! Owns the live connection set and the registry, and reacts to the four
//! transport events: connection opened, frame received, connection closed,
//! connection errored.
//!
//! Forwarding policy:
//! - `connect` frames register (or re-register) a user id on the sending
//!   connection. The latest one wins.
//! - `chat` frames are forwarded to the receiver if it is registered and
//!   writable, and dropped otherwise.
//! - Nothing is ever sent back to the sender.
//!
//! The relay is single-threaded by construction: it takes `&mut self` and
//! is meant to be owned by exactly one task.

use std::collections::HashMap;
use std::fmt;

use relay_protocol::{decode_binary_frame, decode_frame, encode_outbound};
use relay_protocol::{IgnoreReason, InboundFrame, ProtocolError};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::connection::{Connection, ConnectionId, SendError};
use crate::registry::Registry;

/// Where a live connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Open, no `connect` frame yet.
    Unidentified,
    /// Open and backing at least one user id.
    Identified,
}

/// What processing one frame did.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Registered { user_id: String, replaced: bool },
    Delivered { receiver_id: String },
    RecipientOffline { receiver_id: String },
    RecipientUnavailable { receiver_id: String },
    Dropped { receiver_id: String, reason: SendError },
    Ignored(IgnoreReason),
    Malformed,
    UnknownConnection,
}

pub struct Relay<C> {
    connections: HashMap<ConnectionId, C>,
    registry: Registry<C>,
}

impl<C: Connection + Clone> Relay<C> {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            registry: Registry::new(),
        }
    }

    /// A new connection was accepted. It stays unidentified until it sends
    /// a `connect` frame.
    pub fn handle_connect(&mut self, conn: C) {
        let conn_id = conn.id();
        debug!(conn_id = %conn_id, "Connection opened");
        self.connections.insert(conn_id, conn);
    }

    /// Process one text frame from `conn_id`.
    pub fn on_frame(&mut self, conn_id: ConnectionId, raw: &str) -> FrameOutcome {
        self.dispatch(conn_id, decode_frame(raw))
    }

    /// Process one binary frame from `conn_id`. The bytes are read as JSON text.
    pub fn on_binary_frame(&mut self, conn_id: ConnectionId, raw: &[u8]) -> FrameOutcome {
        self.dispatch(conn_id, decode_binary_frame(raw))
    }

    /// The connection closed. Returns the user ids that went offline.
    pub fn on_close(&mut self, conn_id: ConnectionId) -> Vec<String> {
        self.drop_connection(conn_id)
    }

    /// The connection failed. Same cleanup as a close, plus a log line.
    pub fn on_error(&mut self, conn_id: ConnectionId, err: &dyn fmt::Display) -> Vec<String> {
        warn!(conn_id = %conn_id, error = %err, "Connection error");
        self.drop_connection(conn_id)
    }

    pub fn connection_state(&self, conn_id: ConnectionId) -> Option<ConnectionState> {
        if !self.connections.contains_key(&conn_id) {
            return None;
        }
        if self.registry.is_identified(conn_id) {
            Some(ConnectionState::Identified)
        } else {
            Some(ConnectionState::Unidentified)
        }
    }

    /// Connection currently registered for `user_id`, if any.
    pub fn registered(&self, user_id: &str) -> Option<ConnectionId> {
        self.registry.lookup(user_id).map(|conn| conn.id())
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn online_count(&self) -> usize {
        self.registry.len()
    }

    fn dispatch(
        &mut self,
        conn_id: ConnectionId,
        decoded: Result<InboundFrame, ProtocolError>,
    ) -> FrameOutcome {
        let Some(conn) = self.connections.get(&conn_id).cloned() else {
            debug!(conn_id = %conn_id, "Frame from unknown connection");
            return FrameOutcome::UnknownConnection;
        };

        let frame = match decoded {
            Ok(frame) => frame,
            Err(err) => {
                warn!(conn_id = %conn_id, error = %err, "Failed to process frame");
                return FrameOutcome::Malformed;
            }
        };

        debug!(conn_id = %conn_id, kind = frame.kind(), "Frame received");

        match frame {
            InboundFrame::Connect { user_id } => self.register(conn, user_id),
            InboundFrame::Chat {
                receiver_id,
                message,
            } => self.forward(conn_id, receiver_id, &message),
            InboundFrame::Ignored(reason) => {
                debug!(conn_id = %conn_id, reason = ?reason, "Ignoring frame");
                FrameOutcome::Ignored(reason)
            }
        }
    }

    fn register(&mut self, conn: C, user_id: String) -> FrameOutcome {
        let conn_id = conn.id();
        let evicted = self.registry.upsert(&user_id, conn);

        info!(
            conn_id = %conn_id,
            user_id = %user_id,
            evicted = ?evicted,
            "User registered"
        );

        FrameOutcome::Registered {
            user_id,
            replaced: evicted.is_some(),
        }
    }

    fn forward(&self, from: ConnectionId, receiver_id: String, message: &Value) -> FrameOutcome {
        let Some(receiver) = self.registry.lookup(&receiver_id) else {
            debug!(conn_id = %from, receiver_id = %receiver_id, "Recipient offline");
            return FrameOutcome::RecipientOffline { receiver_id };
        };

        if !receiver.is_open() {
            debug!(conn_id = %from, receiver_id = %receiver_id, "Recipient not writable");
            return FrameOutcome::RecipientUnavailable { receiver_id };
        }

        match receiver.send(encode_outbound(message)) {
            Ok(()) => {
                debug!(
                    conn_id = %from,
                    receiver_id = %receiver_id,
                    to = %receiver.id(),
                    "Message relayed"
                );
                FrameOutcome::Delivered { receiver_id }
            }
            Err(reason) => {
                debug!(
                    conn_id = %from,
                    receiver_id = %receiver_id,
                    reason = %reason,
                    "Message dropped"
                );
                FrameOutcome::Dropped {
                    receiver_id,
                    reason,
                }
            }
        }
    }

    fn drop_connection(&mut self, conn_id: ConnectionId) -> Vec<String> {
        self.connections.remove(&conn_id);
        let removed = self.registry.remove_connection(conn_id);
        info!(conn_id = %conn_id, users = ?removed, "Connection closed");
        removed
    }
}

impl<C: Connection + Clone> Default for Relay<C> {
    fn default() -> Self {
        Self::new()
    }
}
