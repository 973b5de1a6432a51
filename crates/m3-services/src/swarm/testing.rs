//! Scripted in-process swarm.
//!
//! Peers are registered as live or dead up front. Circuits are bookkept per
//! local port, and a probe on a port answers with the liveness of the peer
//! whose circuit owns it. Ports without a circuit (the node's own local
//! forward) answer with `self_live`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{Swarm, SwarmError, SwarmPeer};

#[derive(Default)]
pub struct FakeSwarm {
    identity: Mutex<Option<String>>,
    /// Peer ID → live.
    peers: Mutex<BTreeMap<String, bool>>,
    /// Peer IDs reported by `list_swarm_peers`; all registered peers when None.
    listed: Mutex<Option<Vec<String>>>,
    listing_fails: AtomicBool,
    self_live: AtomicBool,
    probe_delay: Mutex<Duration>,
    open: Mutex<BTreeMap<u16, String>>,
    closed: Mutex<Vec<(u16, String)>>,
    list_calls: AtomicUsize,
    probes: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeSwarm {
    pub fn with_identity(id: &str) -> Self {
        let swarm = Self::default();
        *swarm.identity.lock().unwrap() = Some(id.to_string());
        swarm.self_live.store(true, Ordering::SeqCst);
        swarm
    }

    pub fn add_peer(&self, id: &str, live: bool) {
        self.peers.lock().unwrap().insert(id.to_string(), live);
    }

    /// Restrict the swarm listing to `ids`.
    pub fn set_listed(&self, ids: &[&str]) {
        *self.listed.lock().unwrap() = Some(ids.iter().map(|s| s.to_string()).collect());
    }

    pub fn set_self_live(&self, live: bool) {
        self.self_live.store(live, Ordering::SeqCst);
    }

    pub fn set_listing_fails(&self, fails: bool) {
        self.listing_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_probe_delay(&self, delay: Duration) {
        *self.probe_delay.lock().unwrap() = delay;
    }

    /// Circuits currently open, by port.
    pub fn open_circuits(&self) -> Vec<(u16, String)> {
        self.open
            .lock()
            .unwrap()
            .iter()
            .map(|(p, id)| (*p, id.clone()))
            .collect()
    }

    pub fn closed_circuits(&self) -> Vec<(u16, String)> {
        self.closed.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Probes running right now.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of probes observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn failed(command: &str, stderr: &str) -> SwarmError {
        SwarmError::Failed {
            command: command.to_string(),
            status: "exit status: 1".to_string(),
            stderr: stderr.to_string(),
        }
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Swarm for FakeSwarm {
    async fn self_identity(&self) -> Result<String, SwarmError> {
        self.identity
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Self::failed("id", "daemon not running"))
    }

    async fn list_swarm_peers(&self) -> Result<Vec<SwarmPeer>, SwarmError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.listing_fails.load(Ordering::SeqCst) {
            return Err(Self::failed("swarm peers", "daemon not running"));
        }
        let ids: Vec<String> = match self.listed.lock().unwrap().clone() {
            Some(ids) => ids,
            None => self.peers.lock().unwrap().keys().cloned().collect(),
        };
        Ok(ids
            .into_iter()
            .map(|peer_id| SwarmPeer {
                peer_id,
                addr: "/ip4/10.0.0.1/tcp/4001".to_string(),
                latency: "1ms".to_string(),
                muxer: "/yamux/1.0.0".to_string(),
                protocols: vec!["/x/www/1.0".to_string()],
            })
            .collect())
    }

    async fn open_circuit(&self, local_port: u16, peer_id: &str) -> Result<(), SwarmError> {
        if !self.peers.lock().unwrap().contains_key(peer_id) {
            return Err(Self::failed("p2p forward", "routing: not found"));
        }
        self.open
            .lock()
            .unwrap()
            .insert(local_port, peer_id.to_string());
        Ok(())
    }

    async fn close_circuit(&self, local_port: u16, peer_id: &str) -> Result<(), SwarmError> {
        self.open.lock().unwrap().remove(&local_port);
        self.closed
            .lock()
            .unwrap()
            .push((local_port, peer_id.to_string()));
        Ok(())
    }

    async fn probe_liveness(&self, local_port: u16) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        // released on return and when the caller's timeout drops the probe
        let _in_flight = InFlight(&self.in_flight);

        let delay = *self.probe_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let owner = self.open.lock().unwrap().get(&local_port).cloned();
        match owner {
            Some(id) => self.peers.lock().unwrap().get(&id).copied().unwrap_or(false),
            None => self.self_live.load(Ordering::SeqCst),
        }
    }
}
