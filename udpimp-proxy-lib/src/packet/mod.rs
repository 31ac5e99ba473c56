//! The wire packet format shared with the companion client and server.

pub mod checksum;
pub mod codec;
pub mod flags;

pub use codec::{DecodeError, Packet, HEADER_LEN, MAX_PAYLOAD, WIRE_LEN};
pub use flags::{classify, FlagKind};
