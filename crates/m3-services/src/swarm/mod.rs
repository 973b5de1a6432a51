//! Swarm access — the P2P layer the neighborhood is built on.
//!
//! The neighborhood never talks to the swarm directly; it goes through the
//! `Swarm` trait so the backend can be the IPFS daemon in production and a
//! scripted fake in tests.

use async_trait::async_trait;
use serde::Serialize;

mod ipfs;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use ipfs::IpfsSwarm;

/// A peer currently visible in the swarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwarmPeer {
    pub peer_id: String,
    /// Multiaddr the connection runs over.
    pub addr: String,
    pub latency: String,
    pub muxer: String,
    /// Protocols with open streams to this peer.
    pub protocols: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SwarmError {
    #[error("failed to run {0}: {1}")]
    Spawn(String, std::io::Error),
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("`{0}` timed out after {1}s")]
    Timeout(String, u64),
    #[error("unexpected output from `{0}`: {1}")]
    Parse(String, serde_json::Error),
}

/// Capabilities consumed from the swarm.
#[async_trait]
pub trait Swarm: Send + Sync {
    /// This node's own peer ID.
    async fn self_identity(&self) -> Result<String, SwarmError>;

    /// Peers the swarm is currently connected to.
    async fn list_swarm_peers(&self) -> Result<Vec<SwarmPeer>, SwarmError>;

    /// Forward `127.0.0.1:local_port` to the peer's advertised service.
    async fn open_circuit(&self, local_port: u16, peer_id: &str) -> Result<(), SwarmError>;

    /// Tear down a circuit opened by `open_circuit`.
    async fn close_circuit(&self, local_port: u16, peer_id: &str) -> Result<(), SwarmError>;

    /// Is something actually serving behind `127.0.0.1:local_port`?
    async fn probe_liveness(&self, local_port: u16) -> bool;
}
