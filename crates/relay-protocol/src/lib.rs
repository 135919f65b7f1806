//! relay-protocol
//!
//! Wire-level frames for the realtime chat relay.
//!
//! This crate is responsible for turning raw WebSocket text into
//! logical frames (`InboundFrame`) and turning forwarded payloads back
//! into text.
//!
//! - [`frames`]     : logical frame types
//! - [`json_codec`] : JSON encoding/decoding

pub mod frames;
pub mod json_codec;

pub use frames::{IgnoreReason, InboundFrame};
pub use json_codec::{
    decode_binary_frame,
    decode_frame,
    encode_chat,
    encode_connect,
    encode_outbound,
    ProtocolError,
};
