//! relay-server
//!
//! Multi-client async WebSocket server for the chat relay.

pub mod config;
pub mod types;
pub mod server;

// these are internal modules, not re-exported
mod client;
mod relay_task;
