//! Protocol module containing the wire message types and the text codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_event, encode_event, ProtocolError};
pub use messages::*;
