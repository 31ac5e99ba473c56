use super::checksum;
use thiserror::Error;

/// Maximum useful payload bytes; the wire buffer is always `MAX_PAYLOAD`
/// bytes, with the effective length recovered from the first zero byte.
pub const MAX_PAYLOAD: usize = 1024;

const SEQ_LEN: usize = 4;
const ACK_LEN: usize = 4;
const FLAGS_LEN: usize = 1;
const WINDOW_LEN: usize = 1;
const CHECKSUM_LEN: usize = 2;
/// Fixed header size, identical on the wire for every packet.
pub const HEADER_LEN: usize = SEQ_LEN + ACK_LEN + FLAGS_LEN + WINDOW_LEN + CHECKSUM_LEN;
/// Every datagram is exactly this many bytes.
pub const WIRE_LEN: usize = HEADER_LEN + MAX_PAYLOAD;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("short buffer: expected {expected} bytes, got {got}")]
    ShortBuffer { expected: usize, got: usize },
}

/// A fixed-layout packet: header fields in declaration order, followed by
/// the full `MAX_PAYLOAD` payload buffer. Integer fields round-trip in the
/// host's native byte order — a deliberate restriction to homogeneous-endian
/// deployments, not an oversight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub seq_number: u32,
    pub ack_number: u32,
    pub flags: u8,
    pub window_size: u8,
    pub checksum: u16,
    payload: [u8; MAX_PAYLOAD],
}

impl Packet {
    /// Builds a packet and computes its checksum over `payload` the way a
    /// genuine endpoint would. The proxy itself never calls this on the
    /// forwarding path — it only decodes, mutates in place, and re-encodes —
    /// but it is the natural constructor for tests and fixtures.
    pub fn new(seq_number: u32, ack_number: u32, flags: u8, window_size: u8, payload: &[u8]) -> Self {
        let mut buf = [0u8; MAX_PAYLOAD];
        let len = payload.len().min(MAX_PAYLOAD - 1);
        buf[..len].copy_from_slice(&payload[..len]);
        let checksum = checksum::compute(&buf[..len]);
        Packet { seq_number, ack_number, flags, window_size, checksum, payload: buf }
    }

    /// Effective payload length: the offset of the first zero byte, or
    /// `MAX_PAYLOAD` if the buffer has none.
    pub fn effective_len(&self) -> usize {
        self.payload.iter().position(|&b| b == 0).unwrap_or(MAX_PAYLOAD)
    }

    /// The useful payload bytes (excludes the zero terminator and padding).
    pub fn payload(&self) -> &[u8] {
        &self.payload[..self.effective_len()]
    }

    /// Mutable access to the full fixed-capacity buffer, for the corruption
    /// path — it must mutate in place without touching `checksum`, so the
    /// recomputed checksum stops matching the stored one.
    pub fn payload_buf_mut(&mut self) -> &mut [u8; MAX_PAYLOAD] {
        &mut self.payload
    }

    /// True iff the stored checksum matches a fresh computation over the
    /// effective payload. The codec never rejects on mismatch — it only
    /// reports it.
    pub fn verify(&self) -> bool {
        checksum::compute(self.payload()) == self.checksum
    }

    pub fn encode(&self) -> [u8; WIRE_LEN] {
        let mut out = [0u8; WIRE_LEN];
        let mut off = 0;
        out[off..off + SEQ_LEN].copy_from_slice(&self.seq_number.to_ne_bytes());
        off += SEQ_LEN;
        out[off..off + ACK_LEN].copy_from_slice(&self.ack_number.to_ne_bytes());
        off += ACK_LEN;
        out[off] = self.flags;
        off += FLAGS_LEN;
        out[off] = self.window_size;
        off += WINDOW_LEN;
        out[off..off + CHECKSUM_LEN].copy_from_slice(&self.checksum.to_ne_bytes());
        off += CHECKSUM_LEN;
        out[off..off + MAX_PAYLOAD].copy_from_slice(&self.payload);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != WIRE_LEN {
            return Err(DecodeError::ShortBuffer { expected: WIRE_LEN, got: bytes.len() });
        }
        let mut off = 0;
        let seq_number = u32::from_ne_bytes(bytes[off..off + SEQ_LEN].try_into().unwrap());
        off += SEQ_LEN;
        let ack_number = u32::from_ne_bytes(bytes[off..off + ACK_LEN].try_into().unwrap());
        off += ACK_LEN;
        let flags = bytes[off];
        off += FLAGS_LEN;
        let window_size = bytes[off];
        off += WINDOW_LEN;
        let checksum = u16::from_ne_bytes(bytes[off..off + CHECKSUM_LEN].try_into().unwrap());
        off += CHECKSUM_LEN;
        let mut payload = [0u8; MAX_PAYLOAD];
        payload.copy_from_slice(&bytes[off..off + MAX_PAYLOAD]);
        Ok(Packet { seq_number, ack_number, flags, window_size, checksum, payload })
    }
}
