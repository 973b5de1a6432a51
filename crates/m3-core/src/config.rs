//! Configuration system for m3.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $M3_CONFIG (explicit override)
//!   2. $DHNT_BASE/etc/m3.toml
//!   3. $XDG_CONFIG_HOME/m3/config.toml
//!   4. ~/.config/m3/config.toml

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct M3Config {
    pub neighborhood: NeighborhoodConfig,
    pub network: NetworkConfig,
    pub discovery: DiscoveryConfig,
    pub swarm: SwarmConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborhoodConfig {
    /// Peer IDs the node always tries to reach, independent of swarm listing.
    pub pals: Vec<String>,
    /// Alias name → address. `proj.a` resolves through the `proj` entry.
    pub aliases: BTreeMap<String, String>,
    /// Below this many reachable peers a discovery cycle logs a shortage.
    pub min_peers: usize,
    /// At or above this many reachable peers swarm discovery stops checking.
    pub max_peers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Port of the node's own outbound proxy listener.
    pub proxy_port: u16,
    /// Port of the node's local web front.
    pub web_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub pals_interval_secs: u64,
    pub swarm_interval_secs: u64,
    /// Concurrent health checks for the pals job.
    pub pals_workers: usize,
    /// Concurrent health checks for the swarm discovery job.
    pub swarm_workers: usize,
    /// Upper bound on a single liveness probe.
    pub probe_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// IPFS command-line binary driving the swarm.
    pub ipfs_bin: String,
    /// Service protocol name used for p2p forwarding circuits.
    pub protocol: String,
    /// Upper bound on any single swarm command.
    pub command_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Loopback port of the HTTP API.
    pub port: u16,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for NeighborhoodConfig {
    fn default() -> Self {
        Self {
            pals: Vec::new(),
            aliases: BTreeMap::new(),
            min_peers: 0,
            max_peers: 5,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy_port: 18080,
            web_port: 8080,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            pals_interval_secs: 60,
            swarm_interval_secs: 15,
            pals_workers: 8,
            swarm_workers: 32,
            probe_timeout_secs: 3,
        }
    }
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            ipfs_bin: "ipfs".to_string(),
            protocol: "/x/www/1.0".to_string(),
            command_timeout_secs: 10,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 18082 }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("m3")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl M3Config {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            Self::parse(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            M3Config::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        if let Ok(p) = std::env::var("M3_CONFIG") {
            return PathBuf::from(p);
        }
        match std::env::var("DHNT_BASE") {
            Ok(base) if !base.is_empty() => PathBuf::from(base).join("etc").join("m3.toml"),
            _ => config_dir().join("config.toml"),
        }
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&M3Config::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply M3_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Some(p) = env_port("M3_PORT") {
            self.network.proxy_port = p;
        }
        if let Some(p) = env_port("M3_WEB_PORT") {
            self.network.web_port = p;
        }
        if let Some(p) = env_port("M3D_PORT") {
            self.api.port = p;
        }
        if let Ok(v) = std::env::var("M3_NEIGHBORHOOD__MAX_PEERS") {
            if let Ok(n) = v.parse() {
                self.neighborhood.max_peers = n;
            }
        }
        if let Ok(v) = std::env::var("M3_NEIGHBORHOOD__PALS") {
            self.neighborhood.pals = split_list(&v);
        }
        if let Ok(v) = std::env::var("M3_SWARM__IPFS_BIN") {
            self.swarm.ipfs_bin = v;
        }
    }
}

fn env_port(name: &str) -> Option<u16> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Comma-separated list, blanks dropped.
fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
