//! Joining the network via seed nodes.
//!
//! A fresh node knows nobody. Bootstrap pings each configured seed (with
//! retries), then performs an iterative FIND_NODE for the node's own id so
//! the closest region of the key space fills in.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::node::Node;
use crate::{NodeError, Result};

/// Configuration for the bootstrap process.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Seed node addresses to contact initially.
    pub seed_nodes: Vec<SocketAddr>,
    /// Ping attempts per seed node.
    pub max_retries: u32,
    /// Minimum number of seeds that must respond for bootstrap to succeed.
    pub min_responsive_seeds: usize,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            seed_nodes: Vec::new(),
            max_retries: 3,
            min_responsive_seeds: 1,
        }
    }
}

impl BootstrapConfig {
    /// Create a configuration with the given seed nodes.
    pub fn new(seed_nodes: Vec<SocketAddr>) -> Self {
        Self {
            seed_nodes,
            ..Default::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Network`] when no seeds are configured or the
    /// responsiveness requirement cannot be met.
    pub fn validate(&self) -> Result<()> {
        if self.seed_nodes.is_empty() {
            return Err(NodeError::Network("no seed nodes configured".to_string()));
        }
        if self.min_responsive_seeds > self.seed_nodes.len() {
            return Err(NodeError::Network(format!(
                "min_responsive_seeds ({}) exceeds total seed nodes ({})",
                self.min_responsive_seeds,
                self.seed_nodes.len(),
            )));
        }
        Ok(())
    }
}

/// The result of a bootstrap attempt.
#[derive(Clone, Debug)]
pub struct BootstrapResult {
    /// Number of seed nodes that responded.
    pub responsive_seeds: usize,
    /// Contacts in the self-lookup's converged shortlist.
    pub peers_discovered: usize,
}

/// Bootstrap the node: ping seeds, then self-lookup.
///
/// # Errors
///
/// Returns [`NodeError::Network`] when the configuration is invalid or
/// fewer than `min_responsive_seeds` seeds respond.
pub async fn bootstrap(node: &Node, config: &BootstrapConfig) -> Result<BootstrapResult> {
    config.validate()?;

    info!(seed_count = config.seed_nodes.len(), "starting bootstrap");

    let mut responsive_seeds = 0usize;
    for seed in &config.seed_nodes {
        let SocketAddr::V4(seed_v4) = seed else {
            warn!(addr = %seed, "skipping non-IPv4 seed");
            continue;
        };

        let mut connected = false;
        for attempt in 0..config.max_retries {
            debug!(addr = %seed, attempt = attempt + 1, "pinging seed node");
            match node.rpc_ping(*seed_v4.ip(), seed_v4.port()).await {
                Ok(contact) => {
                    info!(addr = %seed, id = %contact.id, "seed node responded");
                    responsive_seeds += 1;
                    connected = true;
                    break;
                }
                Err(e) => {
                    warn!(addr = %seed, attempt = attempt + 1, error = %e, "seed ping failed");
                }
            }
        }
        if !connected {
            warn!(addr = %seed, "seed unreachable after all retries");
        }
    }

    if responsive_seeds < config.min_responsive_seeds {
        return Err(NodeError::Network(format!(
            "only {responsive_seeds} of {} required seed nodes responded",
            config.min_responsive_seeds,
        )));
    }

    let neighbors = node.iterative_find_node(node.node_id()).await;
    let result = BootstrapResult {
        responsive_seeds,
        peers_discovered: neighbors.len(),
    };

    info!(
        responsive_seeds = result.responsive_seeds,
        peers_discovered = result.peers_discovered,
        "bootstrap complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BootstrapConfig::default();
        assert!(config.seed_nodes.is_empty());
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.min_responsive_seeds, 1);
    }

    #[test]
    fn test_validate_no_seeds() {
        assert!(BootstrapConfig::default().validate().is_err());
    }

    #[test]
    fn test_validate_min_exceeds_total() {
        let config = BootstrapConfig {
            seed_nodes: vec!["127.0.0.1:4433".parse().expect("addr")],
            min_responsive_seeds: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_bootstrap_against_live_seed() {
        let seed = Node::start("127.0.0.1:0".parse().expect("addr"))
            .await
            .expect("start seed");
        let joiner = Node::start("127.0.0.1:0".parse().expect("addr"))
            .await
            .expect("start joiner");

        let config = BootstrapConfig::new(vec![seed.self_contact().addr()]);
        let result = bootstrap(&joiner, &config).await.expect("bootstrap");

        assert_eq!(result.responsive_seeds, 1);
        assert!(joiner.find_contact(seed.node_id()).await.is_ok());
    }

    #[tokio::test]
    async fn test_bootstrap_fails_without_responsive_seeds() {
        let joiner = Node::start("127.0.0.1:0".parse().expect("addr"))
            .await
            .expect("start joiner");

        // Reserve a port, then free it so nothing answers there.
        let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = closed.local_addr().expect("addr");
        drop(closed);

        let config = BootstrapConfig {
            seed_nodes: vec![addr],
            max_retries: 1,
            ..Default::default()
        };
        assert!(bootstrap(&joiner, &config).await.is_err());
    }
}
