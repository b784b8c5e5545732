//! Integration test: the self-destructing data layer over a live cluster.
//!
//! Covers the vanish round-trip, epoch-skew recovery, share refresh, and
//! irrecoverability after enough shares are wiped from the network.

use cinder_integration_tests::chained_cluster;
use cinder_vanish::{epoch, locations, ops};

const SHARE_COUNT: u8 = 10;
const THRESHOLD: u8 = 5;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn vanish_roundtrip_and_wipe() {
    let nodes = chained_cluster(4).await;
    let sealer = &nodes[0];
    let reader = &nodes[2];

    let vdo = ops::vanish_data(sealer, b"secret", SHARE_COUNT, THRESHOLD, 24)
        .await
        .expect("seal");
    assert_eq!(vdo.ciphertext.len(), 16 + b"secret".len());

    // Any node holding the object can recover it while shares survive.
    let plaintext = ops::unvanish_data(reader, &vdo)
        .await
        .expect("recover before expiry");
    assert_eq!(plaintext, b"secret");

    // Wipe N-T+1 shares everywhere (recovery may have re-cached shares at
    // arbitrary cluster members, so overwrite on every node).
    let wiped = usize::from(SHARE_COUNT - THRESHOLD + 1);
    let share_locations = locations::locations_for(
        vdo.access_key,
        usize::from(SHARE_COUNT),
        epoch::current_epoch(),
    );
    for location in share_locations.iter().take(wiped) {
        for node in &nodes {
            node.local_put(*location, Vec::new()).await;
        }
    }

    // Below threshold the plaintext is gone, from any vantage point.
    assert!(ops::unvanish_data(reader, &vdo).await.is_none());
    assert!(ops::unvanish_data(sealer, &vdo).await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unvanish_tolerates_one_epoch_of_skew() {
    let nodes = chained_cluster(3).await;
    let sealer = &nodes[0];
    let reader = &nodes[1];

    let vdo = ops::vanish_data(sealer, b"skewed", SHARE_COUNT, THRESHOLD, 8)
        .await
        .expect("seal");

    let sealed_at = epoch::current_epoch();

    // A reader whose clock sits one epoch off still recovers.
    let fast_clock = ops::unvanish_at_epoch(reader, &vdo, sealed_at + 1)
        .await
        .expect("recover with clock one epoch ahead");
    assert_eq!(fast_clock, b"skewed");

    let slow_clock = ops::unvanish_at_epoch(reader, &vdo, sealed_at.saturating_sub(1))
        .await
        .expect("recover with clock one epoch behind");
    assert_eq!(slow_clock, b"skewed");

    // Beyond the skew window the shares are invisible.
    assert!(ops::unvanish_at_epoch(reader, &vdo, sealed_at + 5)
        .await
        .is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn refresh_keeps_the_object_alive() {
    let nodes = chained_cluster(3).await;
    let sealer = &nodes[0];

    let vdo = ops::vanish_data(sealer, b"long lived", SHARE_COUNT, THRESHOLD, 24)
        .await
        .expect("seal");

    // A refresh re-splits and re-stores; the object stays recoverable.
    assert!(ops::refresh_once(sealer, &vdo).await);
    let plaintext = ops::unvanish_data(&nodes[2], &vdo)
        .await
        .expect("recover after refresh");
    assert_eq!(plaintext, b"long lived");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn vanished_shares_defeat_refresh() {
    let nodes = chained_cluster(3).await;
    let sealer = &nodes[0];

    let vdo = ops::vanish_data(sealer, b"doomed", SHARE_COUNT, THRESHOLD, 24)
        .await
        .expect("seal");

    let share_locations = locations::locations_for(
        vdo.access_key,
        usize::from(SHARE_COUNT),
        epoch::current_epoch(),
    );
    for location in &share_locations {
        for node in &nodes {
            node.local_put(*location, Vec::new()).await;
        }
    }

    // With every share gone the refresh loop reports the object dead.
    assert!(!ops::refresh_once(sealer, &vdo).await);
}
