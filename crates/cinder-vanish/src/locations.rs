//! Deterministic share placement.
//!
//! Share locations are drawn from a ChaCha20 stream cipher seeded with
//! `access_key + epoch`, so any holder of the access key derives the same
//! locations for a given epoch, on any machine, without coordination.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use cinder_types::{KadId, ID_BYTES};

/// Derive `count` DHT locations for an access key at an epoch.
pub fn locations_for(access_key: u64, count: usize, epoch: u64) -> Vec<KadId> {
    let mut rng = ChaCha20Rng::seed_from_u64(access_key.wrapping_add(epoch));
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        let mut bytes = [0u8; ID_BYTES];
        rng.fill_bytes(&mut bytes);
        ids.push(KadId(bytes));
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_inputs_same_locations() {
        let a = locations_for(0x1234_5678_9abc_def0, 10, 42);
        let b = locations_for(0x1234_5678_9abc_def0, 10, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_epoch_rotates_locations() {
        let now = locations_for(7, 10, 1000);
        let next = locations_for(7, 10, 1001);
        assert_ne!(now, next);
    }

    #[test]
    fn test_access_key_separates_objects() {
        let a = locations_for(1, 10, 1000);
        let b = locations_for(2, 10, 1000);
        assert_ne!(a, b);
    }

    #[test]
    fn test_count_prefix_is_stable() {
        // Drawing more locations extends the sequence without changing it.
        let short = locations_for(99, 3, 5);
        let long = locations_for(99, 10, 5);
        assert_eq!(short[..], long[..3]);
    }

    #[test]
    fn test_locations_are_distinct() {
        let ids = locations_for(0xDEAD_BEEF, 32, 7);
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
