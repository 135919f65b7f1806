//! Shared types for the relay server.
//!
//! This module defines:
//! - `ClientHandle`: the relay's handle on one connected socket
//! - `RelayEvent`: what client tasks report to the relay task
//! - channel aliases between clients and the relay task

use relay_core::{Connection, ConnectionId, SendError};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::Message;

/// Outbound frames from the relay to a given client.
pub type OutboundTx = mpsc::Sender<Message>;
pub type OutboundRx = mpsc::Receiver<Message>;

/// Handle on a connected client's outbound queue.
///
/// Cloning is cheap; the socket itself is owned by the client task.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    pub id: ConnectionId,
    pub tx: OutboundTx,
}

impl Connection for ClientHandle {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send(&self, text: String) -> Result<(), SendError> {
        self.tx.try_send(Message::text(text)).map_err(|err| match err {
            TrySendError::Full(_) => SendError::Full,
            TrySendError::Closed(_) => SendError::Closed,
        })
    }
}

/// Event flowing from a client task into the relay task.
#[derive(Debug)]
pub enum RelayEvent {
    Opened(ClientHandle),
    Text { id: ConnectionId, text: String },
    Binary { id: ConnectionId, data: Vec<u8> },
    Closed { id: ConnectionId },
    Errored { id: ConnectionId, error: String },
}

/// Channel from clients → relay task. Bounded: a client task waits for
/// room before reading its next frame.
pub type RelayTx = mpsc::Sender<RelayEvent>;
pub type RelayRx = mpsc::Receiver<RelayEvent>;
