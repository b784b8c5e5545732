//! The vanishing data object.

use serde::{Deserialize, Serialize};

/// A sealed piece of self-destructing data.
///
/// The object itself is safe to hold or publish: without at least
/// `threshold` shares from the network, the ciphertext is undecryptable.
/// The access key is not a secret; it only names the share locations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VanishObject {
    /// 63-bit public access key seeding the location derivation.
    pub access_key: u64,
    /// `IV || body` envelope produced by the content key.
    pub ciphertext: Vec<u8>,
    /// Number of shares scattered across the DHT (N).
    pub share_count: u8,
    /// Shares required to reassemble the content key (T).
    pub threshold: u8,
    /// Intended lifetime in hours; the refresh loop runs `timeout / 8`
    /// iterations and then lets the object die.
    pub timeout_hours: u8,
}
