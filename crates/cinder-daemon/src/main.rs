//! cinder-daemon: a long-running Cinder DHT node.
//!
//! Loads the TOML configuration, starts the node, joins the network through
//! the configured seeds, and serves RPCs until interrupted.

mod config;

use tracing::{info, warn};

use cinder_dht::bootstrap::{self, BootstrapConfig};
use cinder_dht::Node;

use crate::config::DaemonConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cinder=info".parse()?),
        )
        .init();

    info!("cinder daemon starting");

    let config = DaemonConfig::load()?;
    let listen_addr = config.listen_addr()?;

    let node = Node::start(listen_addr).await?;
    info!(contact = %node.self_contact(), "node listening");

    let seeds = config.seed_addrs()?;
    if seeds.is_empty() {
        info!("no seed nodes configured, starting a fresh network");
    } else {
        let bootstrap_config = BootstrapConfig {
            seed_nodes: seeds,
            max_retries: config.network.seed_retries,
            min_responsive_seeds: config.network.min_responsive_seeds,
        };
        match bootstrap::bootstrap(&node, &bootstrap_config).await {
            Ok(result) => info!(
                responsive_seeds = result.responsive_seeds,
                peers_discovered = result.peers_discovered,
                "joined the network"
            ),
            Err(e) => warn!(error = %e, "bootstrap failed, continuing isolated"),
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("ctrl-c received, shutting down");

    Ok(())
}
