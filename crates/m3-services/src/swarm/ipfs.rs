//! IPFS-backed swarm — drives a local IPFS daemon through its CLI.
//!
//! Circuits use `ipfs p2p forward`, which requires the daemon to run with
//! `Experimental.Libp2pStreamMounting` enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use m3_core::config::SwarmConfig;

use super::{Swarm, SwarmError, SwarmPeer};
use crate::probe::http_probe;

pub struct IpfsSwarm {
    bin: String,
    protocol: String,
    command_timeout: Duration,
    probe_timeout: Duration,
}

#[derive(Deserialize)]
struct IdOutput {
    #[serde(rename = "ID")]
    id: String,
}

#[derive(Deserialize)]
struct PeersOutput {
    #[serde(rename = "Peers")]
    peers: Option<Vec<IpfsPeer>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct IpfsPeer {
    addr: String,
    peer: String,
    #[serde(default)]
    latency: String,
    #[serde(default)]
    muxer: String,
    #[serde(default)]
    streams: Option<Vec<IpfsStream>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct IpfsStream {
    protocol: String,
}

impl IpfsSwarm {
    pub fn new(config: &SwarmConfig, probe_timeout: Duration) -> Self {
        Self {
            bin: config.ipfs_bin.clone(),
            protocol: config.protocol.clone(),
            command_timeout: Duration::from_secs(config.command_timeout_secs),
            probe_timeout,
        }
    }

    /// Run one CLI command and return its stdout.
    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, SwarmError> {
        let command = format!("{} {}", self.bin, args.join(" "));
        tracing::trace!(%command, "running swarm command");

        let child = Command::new(&self.bin)
            .args(args)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.command_timeout, child)
            .await
            .map_err(|_| SwarmError::Timeout(command.clone(), self.command_timeout.as_secs()))?
            .map_err(|e| SwarmError::Spawn(self.bin.clone(), e))?;

        if !output.status.success() {
            return Err(SwarmError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

fn listen_addr(local_port: u16) -> String {
    format!("/ip4/127.0.0.1/tcp/{local_port}")
}

fn parse_identity(stdout: &[u8]) -> Result<String, SwarmError> {
    serde_json::from_slice::<IdOutput>(stdout)
        .map(|o| o.id)
        .map_err(|e| SwarmError::Parse("id".to_string(), e))
}

fn parse_peers(stdout: &[u8]) -> Result<Vec<SwarmPeer>, SwarmError> {
    let out: PeersOutput =
        serde_json::from_slice(stdout).map_err(|e| SwarmError::Parse("swarm peers".to_string(), e))?;
    Ok(out
        .peers
        .unwrap_or_default()
        .into_iter()
        .map(|p| SwarmPeer {
            peer_id: p.peer,
            addr: p.addr,
            latency: p.latency,
            muxer: p.muxer,
            protocols: p
                .streams
                .unwrap_or_default()
                .into_iter()
                .map(|s| s.protocol)
                .collect(),
        })
        .collect())
}

#[async_trait]
impl Swarm for IpfsSwarm {
    async fn self_identity(&self) -> Result<String, SwarmError> {
        let stdout = self.run(&["id", "--enc=json"]).await?;
        parse_identity(&stdout)
    }

    async fn list_swarm_peers(&self) -> Result<Vec<SwarmPeer>, SwarmError> {
        let stdout = self
            .run(&["swarm", "peers", "--enc=json", "--verbose", "--streams", "--latency"])
            .await?;
        parse_peers(&stdout)
    }

    async fn open_circuit(&self, local_port: u16, peer_id: &str) -> Result<(), SwarmError> {
        let listen = listen_addr(local_port);
        let target = format!("/p2p/{peer_id}");
        self.run(&["p2p", "forward", &self.protocol, &listen, &target])
            .await
            .map(|_| ())
    }

    async fn close_circuit(&self, local_port: u16, peer_id: &str) -> Result<(), SwarmError> {
        let listen = listen_addr(local_port);
        let target = format!("/p2p/{peer_id}");
        self.run(&[
            "p2p",
            "close",
            "--listen-address",
            &listen,
            "--target-address",
            &target,
        ])
        .await
        .map(|_| ())
    }

    async fn probe_liveness(&self, local_port: u16) -> bool {
        http_probe(local_port, self.probe_timeout).await
    }
}
