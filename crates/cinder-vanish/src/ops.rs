//! Seal, recover, and refresh operations.
//!
//! Each share travels as `[share_index || share_bytes]`, so a recovered
//! blob is self-describing regardless of which location it was read from.
//! Recovery is epoch-anchored: the current epoch is tried first, then one
//! epoch back and one forward, to tolerate clock skew and objects sealed
//! just before a boundary.

use std::collections::BTreeMap;
use std::time::Duration;

use rand::{Rng, RngCore};
use tracing::{debug, info, warn};

use cinder_crypto::envelope::{self, KEY_SIZE};
use cinder_crypto::shamir;
use cinder_dht::{Node, ValueLookup};

use crate::epoch::{self, EPOCH_RANGE_HOURS, EPOCH_RANGE_SECS};
use crate::locations::locations_for;
use crate::object::VanishObject;
use crate::{Result, VanishError};

/// Seal `data` into a [`VanishObject`] and scatter its key shares.
///
/// Draws a fresh 32-byte content key and a 63-bit access key, encrypts,
/// splits the key `threshold`-of-`share_count`, and iteratively stores each
/// share at the current epoch's derived locations.
///
/// # Errors
///
/// Returns [`VanishError::InvalidParameters`] unless
/// `0 < threshold <= share_count`; crypto failures propagate.
pub async fn vanish_data(
    node: &Node,
    data: &[u8],
    share_count: u8,
    threshold: u8,
    timeout_hours: u8,
) -> Result<VanishObject> {
    if threshold == 0 || threshold > share_count {
        return Err(VanishError::InvalidParameters {
            share_count,
            threshold,
        });
    }

    let mut key = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut key);

    let ciphertext = envelope::encrypt(&key, data)?;
    let shares = shamir::split(share_count, threshold, &key)?;
    let access_key = random_access_key();

    let current = epoch::current_epoch();
    store_shares(node, access_key, &shares, current).await;

    info!(
        access_key,
        share_count, threshold, epoch = current, "data sealed"
    );

    Ok(VanishObject {
        access_key,
        ciphertext,
        share_count,
        threshold,
        timeout_hours,
    })
}

/// Recover the plaintext of a sealed object, or `None` once it has expired.
///
/// Tries the current epoch, then one epoch back and one forward.
pub async fn unvanish_data(node: &Node, vdo: &VanishObject) -> Option<Vec<u8>> {
    unvanish_at_epoch(node, vdo, epoch::current_epoch()).await
}

/// Recover the plaintext with recovery anchored at an explicit base epoch.
///
/// Like [`unvanish_data`] but clock-independent; the skew window
/// `{base, base-1, base+1}` still applies.
pub async fn unvanish_at_epoch(
    node: &Node,
    vdo: &VanishObject,
    base_epoch: u64,
) -> Option<Vec<u8>> {
    let key = recover_key_near(node, vdo, base_epoch).await?;
    envelope::decrypt(&key, &vdo.ciphertext).ok()
}

/// Re-split and re-scatter a still-recoverable object at the current
/// epoch's locations. Returns whether the object survived.
pub async fn refresh_once(node: &Node, vdo: &VanishObject) -> bool {
    let current = epoch::current_epoch();
    let Some(key) = recover_key_near(node, vdo, current).await else {
        warn!(access_key = vdo.access_key, "refresh: key no longer recoverable");
        return false;
    };

    let shares = match shamir::split(vdo.share_count, vdo.threshold, &key) {
        Ok(shares) => shares,
        Err(e) => {
            warn!(access_key = vdo.access_key, error = %e, "refresh: re-split failed");
            return false;
        }
    };

    store_shares(node, vdo.access_key, &shares, current).await;
    debug!(access_key = vdo.access_key, epoch = current, "shares refreshed");
    true
}

/// Keep an object alive across epoch rotations for its configured lifetime.
///
/// Wakes once per epoch, `timeout / 8` times, refreshing the shares at the
/// new epoch's locations; then exits and lets the object die. Ends early if
/// the key already became unrecoverable.
pub fn spawn_refresh(node: Node, vdo: VanishObject) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let rounds = u64::from(vdo.timeout_hours) / EPOCH_RANGE_HOURS;
        for round in 0..rounds {
            tokio::time::sleep(Duration::from_secs(EPOCH_RANGE_SECS)).await;
            if !refresh_once(&node, &vdo).await {
                debug!(access_key = vdo.access_key, round, "refresh loop ended early");
                return;
            }
        }
        info!(
            access_key = vdo.access_key,
            "refresh window elapsed, object left to expire"
        );
    })
}

/// Store every share at its location for the given epoch.
async fn store_shares(
    node: &Node,
    access_key: u64,
    shares: &BTreeMap<u8, Vec<u8>>,
    at_epoch: u64,
) {
    let locations = locations_for(access_key, shares.len(), at_epoch);
    for (location, (index, body)) in locations.iter().zip(shares.iter()) {
        let stored_at = node.iterative_store(*location, encode_share(*index, body)).await;
        debug!(
            share = index,
            location = %location,
            replicas = stored_at.len(),
            "share stored"
        );
    }
}

/// Reassemble the content key near a base epoch, tolerating one epoch of
/// skew in either direction.
async fn recover_key_near(
    node: &Node,
    vdo: &VanishObject,
    base_epoch: u64,
) -> Option<[u8; KEY_SIZE]> {
    let mut candidates = vec![base_epoch];
    if base_epoch > 0 {
        candidates.push(base_epoch - 1);
    }
    candidates.push(base_epoch + 1);

    for at_epoch in candidates {
        if let Some(key) = recover_key_at(node, vdo, at_epoch).await {
            return Some(key);
        }
    }
    None
}

/// Reassemble the content key from one epoch's locations, stopping as soon
/// as the threshold is met. `None` when under threshold.
async fn recover_key_at(node: &Node, vdo: &VanishObject, at_epoch: u64) -> Option<[u8; KEY_SIZE]> {
    let locations = locations_for(vdo.access_key, vdo.share_count as usize, at_epoch);
    let threshold = vdo.threshold as usize;

    let mut shares: BTreeMap<u8, Vec<u8>> = BTreeMap::new();
    for location in locations {
        if let ValueLookup::Found { value, .. } = node.iterative_find_value(location).await {
            if let Some((index, body)) = decode_share(&value) {
                shares.insert(index, body);
            }
        }
        if shares.len() >= threshold {
            break;
        }
    }

    if shares.len() < threshold {
        debug!(
            access_key = vdo.access_key,
            epoch = at_epoch,
            recovered = shares.len(),
            threshold,
            "under share threshold"
        );
        return None;
    }

    let secret = shamir::combine(&shares).ok()?;
    secret.try_into().ok()
}

/// 63-bit access key (the top bit is always clear).
fn random_access_key() -> u64 {
    rand::thread_rng().gen::<u64>() >> 1
}

/// `[share_index || share_bytes]` wire form.
fn encode_share(index: u8, body: &[u8]) -> Vec<u8> {
    let mut wire = Vec::with_capacity(1 + body.len());
    wire.push(index);
    wire.extend_from_slice(body);
    wire
}

/// Inverse of [`encode_share`]; `None` for blobs too short to be a share.
fn decode_share(wire: &[u8]) -> Option<(u8, Vec<u8>)> {
    let (&index, body) = wire.split_first()?;
    if body.is_empty() {
        return None;
    }
    Some((index, body.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_key_is_63_bits() {
        for _ in 0..64 {
            assert_eq!(random_access_key() >> 63, 0);
        }
    }

    #[test]
    fn test_share_wire_roundtrip() {
        let wire = encode_share(7, b"share body");
        assert_eq!(wire[0], 7);
        let (index, body) = decode_share(&wire).expect("decode");
        assert_eq!(index, 7);
        assert_eq!(body, b"share body");
    }

    #[test]
    fn test_decode_rejects_empty_blobs() {
        assert!(decode_share(&[]).is_none());
        assert!(decode_share(&[3]).is_none());
    }

    #[tokio::test]
    async fn test_vanish_rejects_bad_parameters() {
        let node = Node::start("127.0.0.1:0".parse().expect("addr"))
            .await
            .expect("start node");

        assert!(matches!(
            vanish_data(&node, b"secret", 3, 5, 8).await,
            Err(VanishError::InvalidParameters { .. })
        ));
        assert!(vanish_data(&node, b"secret", 3, 0, 8).await.is_err());
    }

    #[tokio::test]
    async fn test_lone_node_cannot_recover() {
        // With no peers, the shares are stored nowhere; recovery stays
        // under threshold and must return None rather than fail.
        let node = Node::start("127.0.0.1:0".parse().expect("addr"))
            .await
            .expect("start node");

        let vdo = vanish_data(&node, b"secret", 4, 2, 8).await.expect("seal");
        assert!(unvanish_data(&node, &vdo).await.is_none());
        assert!(!refresh_once(&node, &vdo).await);
    }
}
