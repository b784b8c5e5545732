//! # cinder-dht
//!
//! Kademlia node core for the Cinder network.
//!
//! This crate implements:
//! - the k-bucket routing table with least-recently-seen eviction guarded by
//!   a liveness probe, behind a single coordinator task
//! - the local value store behind its own coordinator task
//! - the four RPC handlers (PING, STORE, FIND_NODE, FIND_VALUE) and their
//!   outbound client stubs
//! - the iterative lookup engine (bounded parallelism, per-peer deadlines,
//!   shortlist-convergence termination)
//! - seed-node bootstrap
//!
//! ## Key Parameters
//!
//! | Parameter | Value |
//! |---|---|
//! | K (bucket size, shortlist size) | 20 |
//! | alpha (lookup parallelism) | 3 |
//! | Buckets | 160 (one per id bit) |
//! | Node-lookup probe deadline | 1000 ms |
//! | Value-lookup probe deadline | 300 ms |
//! | Lookup round cap | 32 |

pub mod bootstrap;
pub mod kbuckets;
pub mod lookup;
pub mod node;
pub mod rpc;
pub mod store;

pub use kbuckets::{Pinger, RoutingHandle};
pub use lookup::ValueLookup;
pub use node::{Node, ValueReply};
pub use store::StoreHandle;

use std::time::Duration;

use cinder_transport::TransportError;

/// Bucket capacity and shortlist size.
pub const K: usize = 20;

/// Lookup parallelism factor.
pub const ALPHA: usize = 3;

/// Number of routing buckets (one per bit of the 160-bit key space).
pub const NUM_BUCKETS: usize = cinder_types::ID_BITS;

/// Per-peer deadline for FIND_NODE probes during a node lookup.
pub const NODE_PROBE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Per-peer deadline for FIND_VALUE probes during a value lookup.
pub const VALUE_PROBE_TIMEOUT: Duration = Duration::from_millis(300);

/// Deadline for PING and STORE calls, including the liveness probe that
/// guards bucket eviction.
pub const RPC_TIMEOUT: Duration = Duration::from_millis(1000);

/// Defensive cap on lookup rounds, against pathological churn.
pub const MAX_LOOKUP_ROUNDS: usize = 32;

/// Error types for node operations.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// The requested contact or value is not known.
    #[error("Not Found")]
    NotFound,

    /// The peer could not be reached or answered garbage.
    #[error("network error: {0}")]
    Network(String),

    /// Transport-level failure (dial, frame, decode, deadline).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Convenience result type for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;
