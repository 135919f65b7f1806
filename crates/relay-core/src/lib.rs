//! relay-core
//!
//! Pure relay logic:
//! - connection handles (the relay's view of a live socket)
//! - the user → connection registry
//! - the frame dispatcher that forwards chat messages

pub mod connection;
pub mod registry;
pub mod relay;

pub use connection::{Connection, ConnectionId, SendError};
pub use registry::Registry;
pub use relay::{ConnectionState, FrameOutcome, Relay};
