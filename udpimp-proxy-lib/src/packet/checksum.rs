//! The payload checksum used by the companion endpoints.
//!
//! Two independent 8-bit reductions multiplied into a 16-bit value.
//! Deliberately weak — it exists so the proxy's corruption path can make
//! forwarded data fail it, not to provide real integrity.

/// `c1 = (sum of byte * 34) mod 256`, computed with wrapping u8 arithmetic.
fn reduce_sum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b.wrapping_mul(34)))
}

/// `c2 = xor of every byte`.
fn reduce_xor(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Checksum over `data`, which callers pass already truncated to the
/// effective payload length.
pub fn compute(data: &[u8]) -> u16 {
    let c1 = reduce_sum(data);
    let c2 = reduce_xor(data);
    (c1 as u16) * (c2 as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_checksums_to_zero() {
        assert_eq!(compute(&[]), 0);
    }

    #[test]
    fn matches_hand_computed_value() {
        let data = b"abc";
        // c1 = (97*34 + 98*34 + 99*34) mod 256
        let c1 = (97u8.wrapping_mul(34))
            .wrapping_add(98u8.wrapping_mul(34))
            .wrapping_add(99u8.wrapping_mul(34));
        let c2 = 97u8 ^ 98u8 ^ 99u8;
        assert_eq!(compute(data), (c1 as u16) * (c2 as u16));
    }

    #[test]
    fn single_byte_flip_usually_changes_checksum() {
        let original = b"hello proxy";
        let mut corrupted = *original;
        corrupted[0] ^= 0xff;
        assert_ne!(compute(original), compute(&corrupted));
    }
}
