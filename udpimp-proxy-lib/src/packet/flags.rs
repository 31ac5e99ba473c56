//! The closed set of flag byte values the companion client/server exchange.
//!
//! Values are fixed by the wire-compatibility contract: they must match
//! whatever the reliable-transport endpoints use, byte-for-byte.

/// Handshake initiation.
pub const SYN: u8 = 0x01;
/// Handshake response.
pub const SYNACK: u8 = 0x02;
/// Plain acknowledgement, no payload.
pub const ACK: u8 = 0x04;
/// Data segment carrying a payload, piggy-backing an ack.
pub const PSHACK: u8 = 0x08;
/// Connection teardown request.
pub const FINACK: u8 = 0x10;
/// Reset.
pub const RSTACK: u8 = 0x20;

/// Classification of a raw flags byte. `Unknown` carries the original byte
/// through unchanged — the codec never rejects a datagram for an
/// unrecognized flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Syn,
    SynAck,
    Ack,
    PshAck,
    FinAck,
    RstAck,
    Unknown(u8),
}

pub fn classify(flags: u8) -> FlagKind {
    match flags {
        SYN => FlagKind::Syn,
        SYNACK => FlagKind::SynAck,
        ACK => FlagKind::Ack,
        PSHACK => FlagKind::PshAck,
        FINACK => FlagKind::FinAck,
        RSTACK => FlagKind::RstAck,
        other => FlagKind::Unknown(other),
    }
}
