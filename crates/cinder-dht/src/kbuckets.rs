//! Kademlia routing table with XOR-distance metric.
//!
//! 160 k-buckets, one per bit of the key space, each an ordered list of up
//! to K=20 contacts: front = least-recently-seen, back = most-recently-seen.
//! A contact lives in the bucket indexed by the prefix length of its XOR
//! distance from the local id.
//!
//! ## LRS eviction
//!
//! When a bucket is full and a new contact is seen, the least-recently-seen
//! entry is pinged. If the ping fails, the stale entry is evicted and the
//! new contact appended; if it succeeds, the stale entry moves to the back
//! and the newcomer is discarded (Kademlia's preference for long-lived
//! peers).
//!
//! ## Coordinator
//!
//! All bucket state lives inside a single task serving a request channel,
//! so mutations and lookups are serialized without exposing a lock. The
//! liveness probe goes through an injected [`Pinger`] capability; PING is
//! defined on the node, and the capability breaks that cycle.

use std::collections::VecDeque;
use std::net::Ipv4Addr;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use cinder_types::{Contact, KadId};

use crate::{K, NUM_BUCKETS};

/// Liveness-probe capability used by the eviction check.
pub trait Pinger: Send + Sync + 'static {
    /// Probe a peer; `true` means it answered in time.
    fn ping(&self, host: Ipv4Addr, port: u16) -> impl std::future::Future<Output = bool> + Send;
}

/// The bucket array. Owned exclusively by the coordinator task.
struct KBuckets {
    self_id: KadId,
    buckets: Vec<VecDeque<Contact>>,
}

impl KBuckets {
    fn new(self_id: KadId) -> Self {
        let mut buckets = Vec::with_capacity(NUM_BUCKETS);
        for _ in 0..NUM_BUCKETS {
            buckets.push(VecDeque::with_capacity(K));
        }
        Self { self_id, buckets }
    }

    /// Bucket index for an id: prefix length of the XOR distance from self.
    /// `None` for the local id itself, which is never stored.
    fn bucket_index(&self, id: &KadId) -> Option<usize> {
        let prefix = self.self_id.xor(id).prefix_len();
        if prefix >= NUM_BUCKETS {
            None
        } else {
            Some(prefix)
        }
    }

    fn find_one(&self, id: &KadId) -> Option<Contact> {
        let index = self.bucket_index(id)?;
        self.buckets[index].iter().find(|c| c.id == *id).copied()
    }

    fn remove(&mut self, id: &KadId) {
        if let Some(index) = self.bucket_index(id) {
            if let Some(pos) = self.buckets[index].iter().position(|c| c.id == *id) {
                self.buckets[index].remove(pos);
            }
        }
    }

    /// The up-to-k contacts closest to `target`, nearest first.
    ///
    /// Walks the target's own bucket, then the closer buckets upward, then
    /// the farther buckets downward, and finally sorts the collected
    /// contacts by full XOR distance.
    fn find_closest(&self, target: &KadId) -> Vec<Contact> {
        let start = self.self_id.xor(target).prefix_len().min(NUM_BUCKETS - 1);

        let mut result: Vec<Contact> = Vec::with_capacity(K);
        let order = std::iter::once(start)
            .chain(start + 1..NUM_BUCKETS)
            .chain((0..start).rev());
        'walk: for index in order {
            for contact in &self.buckets[index] {
                if result.len() == K {
                    break 'walk;
                }
                result.push(*contact);
            }
        }

        result.sort_by_key(|c| c.id.xor(target));
        result
    }
}

/// Requests served by the routing coordinator.
enum RoutingCommand {
    Update(Contact),
    Remove(KadId),
    FindOne(KadId, oneshot::Sender<Option<Contact>>),
    FindClosest(KadId, oneshot::Sender<Vec<Contact>>),
}

/// Async handle to the routing coordinator. Cheap to clone.
#[derive(Clone)]
pub struct RoutingHandle {
    tx: mpsc::Sender<RoutingCommand>,
}

impl RoutingHandle {
    /// Spawn the coordinator task for a fresh, empty table.
    pub fn spawn<P: Pinger>(self_id: KadId, pinger: P) -> Self {
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(run_coordinator(KBuckets::new(self_id), pinger, rx));
        Self { tx }
    }

    /// Record liveness of a contact.
    ///
    /// May trigger an eviction probe inside the coordinator; callers on the
    /// RPC reply path should spawn this rather than await it.
    pub async fn update(&self, contact: Contact) {
        let _ = self.tx.send(RoutingCommand::Update(contact)).await;
    }

    /// Drop a contact from its bucket; silent if absent.
    pub async fn remove(&self, id: KadId) {
        let _ = self.tx.send(RoutingCommand::Remove(id)).await;
    }

    /// Exact-match lookup in the single bucket the id maps to.
    pub async fn find_one(&self, id: KadId) -> Option<Contact> {
        let (reply, rx) = oneshot::channel();
        if self
            .tx
            .send(RoutingCommand::FindOne(id, reply))
            .await
            .is_err()
        {
            return None;
        }
        rx.await.unwrap_or(None)
    }

    /// The up-to-k closest contacts to `target`, nearest first.
    pub async fn find_closest(&self, target: KadId) -> Vec<Contact> {
        let (reply, rx) = oneshot::channel();
        if self
            .tx
            .send(RoutingCommand::FindClosest(target, reply))
            .await
            .is_err()
        {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }
}

/// The coordinator loop. Exits when every handle is dropped.
async fn run_coordinator<P: Pinger>(
    mut buckets: KBuckets,
    pinger: P,
    mut rx: mpsc::Receiver<RoutingCommand>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            RoutingCommand::Update(contact) => update(&mut buckets, &pinger, contact).await,
            RoutingCommand::Remove(id) => buckets.remove(&id),
            RoutingCommand::FindOne(id, reply) => {
                let _ = reply.send(buckets.find_one(&id));
            }
            RoutingCommand::FindClosest(target, reply) => {
                let _ = reply.send(buckets.find_closest(&target));
            }
        }
    }
}

async fn update<P: Pinger>(buckets: &mut KBuckets, pinger: &P, contact: Contact) {
    let Some(index) = buckets.bucket_index(&contact.id) else {
        // The contact is this node itself.
        return;
    };

    let bucket = &mut buckets.buckets[index];

    // Already known: move to most-recently-seen.
    if let Some(pos) = bucket.iter().position(|c| c.id == contact.id) {
        if let Some(existing) = bucket.remove(pos) {
            bucket.push_back(existing);
        }
        return;
    }

    if bucket.len() < K {
        bucket.push_back(contact);
        return;
    }

    // Bucket full: probe the least-recently-seen entry before deciding.
    let Some(front) = bucket.front().copied() else {
        return;
    };
    if pinger.ping(front.host, front.port).await {
        // Still alive; it keeps its slot and the newcomer is dropped.
        bucket.pop_front();
        bucket.push_back(front);
        debug!(bucket = index, kept = %front.id, "full bucket kept live peer");
    } else {
        bucket.pop_front();
        bucket.push_back(contact);
        debug!(bucket = index, evicted = %front.id, added = %contact.id, "evicted dead peer");
    }
}
