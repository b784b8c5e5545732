//! Configuration file management.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Network settings.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Address to listen on. Port 0 = OS-assigned ephemeral port.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Seed nodes to bootstrap from. Empty = start a new network.
    #[serde(default)]
    pub seed_nodes: Vec<String>,
    /// Ping attempts per seed node.
    #[serde(default = "default_seed_retries")]
    pub seed_retries: u32,
    /// Minimum number of seeds that must respond.
    #[serde(default = "default_min_responsive_seeds")]
    pub min_responsive_seeds: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_listen_addr() -> String {
    "0.0.0.0:0".to_string()
}

fn default_seed_retries() -> u32 {
    3
}

fn default_min_responsive_seeds() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            seed_nodes: Vec::new(),
            seed_retries: default_seed_retries(),
            min_responsive_seeds: default_min_responsive_seeds(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: DaemonConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// The configured listen address, parsed.
    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.network.listen_addr.parse()?)
    }

    /// The configured seed addresses, parsed.
    pub fn seed_addrs(&self) -> anyhow::Result<Vec<SocketAddr>> {
        self.network
            .seed_nodes
            .iter()
            .map(|s| Ok(s.parse()?))
            .collect()
    }

    /// The config file path.
    fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// The data directory, `CINDER_DATA_DIR` or `~/.cinder`.
    fn data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("CINDER_DATA_DIR") {
            return PathBuf::from(dir);
        }
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".cinder"))
            .unwrap_or_else(|_| PathBuf::from("/tmp/cinder"))
    }
}
