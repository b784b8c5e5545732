//! 160-bit identifiers with the XOR distance metric.
//!
//! A [`KadId`] names both nodes and stored values. Distance between two
//! identifiers is their byte-wise XOR interpreted as a 160-bit unsigned
//! integer; the derived lexicographic ordering on the byte array is exactly
//! that numeric ordering, so `KadId`'s `Ord` can be used to compare
//! distances directly.

use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{Result, TypeError, ID_BITS, ID_BYTES};

/// A 160-bit identifier in the DHT key space.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KadId(pub [u8; ID_BYTES]);

impl KadId {
    /// The all-zero identifier (distance from any id to itself).
    pub const ZERO: KadId = KadId([0u8; ID_BYTES]);

    /// Draw a fresh identifier from the OS-backed RNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        KadId(bytes)
    }

    /// Construct from a raw byte array.
    pub fn from_bytes(bytes: [u8; ID_BYTES]) -> Self {
        KadId(bytes)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ID_BYTES] {
        &self.0
    }

    /// Byte-wise XOR of two identifiers.
    pub fn xor(&self, other: &KadId) -> KadId {
        let mut out = [0u8; ID_BYTES];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = self.0[i] ^ other.0[i];
        }
        KadId(out)
    }

    /// Number of leading zero bits, MSB first.
    ///
    /// Returns [`ID_BITS`] (160) for the all-zero identifier. Applied to an
    /// XOR distance this is the routing bucket index.
    pub fn prefix_len(&self) -> usize {
        for (i, byte) in self.0.iter().enumerate() {
            if *byte != 0 {
                return i * 8 + byte.leading_zeros() as usize;
            }
        }
        ID_BITS
    }

    /// The 40-character lowercase hex form used in result buffers.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the 40-character hex form.
    pub fn from_hex(s: &str) -> Result<Self> {
        let raw = hex::decode(s).map_err(|_| TypeError::InvalidHex(s.to_string()))?;
        let bytes: [u8; ID_BYTES] = raw
            .try_into()
            .map_err(|_| TypeError::InvalidHex(s.to_string()))?;
        Ok(KadId(bytes))
    }
}

impl fmt::Display for KadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for KadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KadId({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_properties() {
        let x = KadId::random();
        let y = KadId::random();
        let z = KadId::random();

        // Associativity and self-annihilation.
        assert_eq!(x.xor(&y.xor(&z)), x.xor(&y).xor(&z));
        assert_eq!(x.xor(&x), KadId::ZERO);

        // Symmetry.
        assert_eq!(x.xor(&y), y.xor(&x));
    }

    #[test]
    fn test_prefix_len() {
        assert_eq!(KadId::ZERO.prefix_len(), ID_BITS);

        let mut bytes = [0u8; ID_BYTES];
        bytes[0] = 0x80;
        assert_eq!(KadId(bytes).prefix_len(), 0);

        bytes[0] = 0x01;
        assert_eq!(KadId(bytes).prefix_len(), 7);

        let mut low = [0u8; ID_BYTES];
        low[1] = 0x01;
        assert_eq!(KadId(low).prefix_len(), 15);

        let mut last = [0u8; ID_BYTES];
        last[ID_BYTES - 1] = 0x01;
        assert_eq!(KadId(last).prefix_len(), ID_BITS - 1);
    }

    #[test]
    fn test_ordering_matches_numeric_distance() {
        let mut near = [0u8; ID_BYTES];
        near[ID_BYTES - 1] = 0x01;
        let mut far = [0u8; ID_BYTES];
        far[0] = 0x80;

        assert!(KadId(near) < KadId(far));
    }

    #[test]
    fn test_hex_roundtrip() {
        let id = KadId::random();
        let text = id.to_hex();
        assert_eq!(text.len(), 40);
        assert_eq!(text, text.to_lowercase());

        let parsed = KadId::from_hex(&text).expect("parse hex id");
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(KadId::from_hex("zz").is_err());
        assert!(KadId::from_hex("abcd").is_err());
    }

    #[test]
    fn test_random_ids_differ() {
        // Two 160-bit random draws colliding is astronomically unlikely.
        assert_ne!(KadId::random(), KadId::random());
    }
}
