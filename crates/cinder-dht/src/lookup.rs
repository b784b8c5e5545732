//! Iterative lookup engine.
//!
//! Drives FIND_NODE or FIND_VALUE outward until the shortlist converges.
//! Each round re-reads the shortlist (the k closest known contacts to the
//! target) from the routing table, dispatches up to alpha=3 not-yet-probed
//! members concurrently through a bounded channel, and waits for each probe
//! to reply or hit its per-peer deadline.
//!
//! Dead peers are marked and, for node lookups, purged from the routing
//! table, which reshapes the next round's shortlist. The lookup ends when
//! every shortlist member has answered, when nothing probeable remains, or
//! when a value lookup hits; outstanding probes are then simply abandoned
//! and their late results discarded. A round cap guards against
//! pathological churn.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;

use cinder_types::{Contact, KadId};

use crate::node::{Node, ValueReply};
use crate::{ALPHA, MAX_LOOKUP_ROUNDS};

/// Outcome of an iterative value lookup.
#[derive(Clone, Debug)]
pub enum ValueLookup {
    /// Some peer returned the value.
    Found {
        /// The stored bytes.
        value: Vec<u8>,
        /// The shortlist at the moment of the hit.
        shortlist: Vec<Contact>,
    },
    /// The lookup converged without finding the value.
    NotFound {
        /// The converged shortlist.
        shortlist: Vec<Contact>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum PeerStatus {
    Pending,
    Ok,
    Dead,
}

enum ProbeOutcome {
    /// The peer answered; any returned contacts are already merged.
    Answered,
    /// The peer returned the value we were looking for.
    Value(Vec<u8>),
    /// Timeout or failure.
    Failed,
}

/// One in-flight iterative lookup. Owns its status map for its lifetime.
pub(crate) struct Lookup {
    node: Node,
    target: KadId,
    status: HashMap<KadId, PeerStatus>,
}

impl Lookup {
    pub(crate) fn new(node: Node, target: KadId) -> Self {
        Self {
            node,
            target,
            status: HashMap::new(),
        }
    }

    /// Iterative FIND_NODE: converge on the k closest contacts.
    pub(crate) async fn run_node(mut self) -> Vec<Contact> {
        for round in 0..MAX_LOOKUP_ROUNDS {
            let shortlist = self.node.routing.find_closest(self.target).await;
            if shortlist.is_empty() {
                return Vec::new();
            }
            if self.converged(&shortlist) {
                return shortlist;
            }

            let batch = self.next_batch(&shortlist);
            if batch.is_empty() {
                // Everything probeable answered or died; the list is stable.
                return shortlist;
            }

            let mut results = self.dispatch(batch, false);
            while let Some((id, outcome)) = results.recv().await {
                match outcome {
                    ProbeOutcome::Answered | ProbeOutcome::Value(_) => {
                        self.status.insert(id, PeerStatus::Ok);
                    }
                    ProbeOutcome::Failed => {
                        self.status.insert(id, PeerStatus::Dead);
                        self.node.routing.remove(id).await;
                    }
                }
            }
            debug!(round, target = %self.target, "node lookup round complete");
        }

        self.node.routing.find_closest(self.target).await
    }

    /// Iterative FIND_VALUE: like [`run_node`](Lookup::run_node) but
    /// short-circuits on a hit.
    pub(crate) async fn run_value(mut self) -> ValueLookup {
        for round in 0..MAX_LOOKUP_ROUNDS {
            let shortlist = self.node.routing.find_closest(self.target).await;
            if shortlist.is_empty() || self.converged(&shortlist) {
                return ValueLookup::NotFound { shortlist };
            }

            let batch = self.next_batch(&shortlist);
            if batch.is_empty() {
                return ValueLookup::NotFound { shortlist };
            }

            let mut results = self.dispatch(batch, true);
            while let Some((id, outcome)) = results.recv().await {
                match outcome {
                    ProbeOutcome::Value(value) => {
                        // Dropping the receiver abandons the round's
                        // remaining probes; their results are ignored.
                        let shortlist = self.node.routing.find_closest(self.target).await;
                        debug!(round, target = %self.target, "value lookup hit");
                        return ValueLookup::Found { value, shortlist };
                    }
                    ProbeOutcome::Answered => {
                        self.status.insert(id, PeerStatus::Ok);
                    }
                    ProbeOutcome::Failed => {
                        self.status.insert(id, PeerStatus::Dead);
                    }
                }
            }
            debug!(round, target = %self.target, "value lookup round complete");
        }

        let shortlist = self.node.routing.find_closest(self.target).await;
        ValueLookup::NotFound { shortlist }
    }

    /// Every shortlist member has answered.
    fn converged(&self, shortlist: &[Contact]) -> bool {
        shortlist
            .iter()
            .all(|c| self.status.get(&c.id) == Some(&PeerStatus::Ok))
    }

    /// Up to alpha shortlist members not probed yet.
    fn next_batch(&self, shortlist: &[Contact]) -> Vec<Contact> {
        shortlist
            .iter()
            .filter(|c| !self.status.contains_key(&c.id))
            .take(ALPHA)
            .copied()
            .collect()
    }

    /// Launch the round's probes; results arrive on the returned channel,
    /// which closes once every probe has reported or been abandoned.
    fn dispatch(
        &mut self,
        batch: Vec<Contact>,
        value_mode: bool,
    ) -> mpsc::Receiver<(KadId, ProbeOutcome)> {
        let (tx, rx) = mpsc::channel(ALPHA);
        for contact in batch {
            self.status.insert(contact.id, PeerStatus::Pending);
            let node = self.node.clone();
            let target = self.target;
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = if value_mode {
                    match node.rpc_find_value(&contact, target).await {
                        Ok(ValueReply::Value(value)) => ProbeOutcome::Value(value),
                        Ok(ValueReply::Nodes(_)) => ProbeOutcome::Answered,
                        Err(_) => ProbeOutcome::Failed,
                    }
                } else {
                    match node.rpc_find_node(&contact, target).await {
                        Ok(_) => ProbeOutcome::Answered,
                        Err(_) => ProbeOutcome::Failed,
                    }
                };
                let _ = tx.send((contact.id, outcome)).await;
            });
        }
        rx
    }
}
