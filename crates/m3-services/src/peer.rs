//! Peer registry — one record per known swarm peer.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::Serialize;

/// Last check failed, peer unreachable.
pub const RANK_UNREACHABLE: i32 = -1;
/// Never confirmed either way.
pub const RANK_NEUTRAL: i32 = 0;
/// Confirmed reachable by a liveness probe.
pub const RANK_REACHABLE: i32 = 1;

/// Outcome of the latest check of one peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerRecord {
    /// Swarm peer ID. Registry key.
    pub id: String,
    /// Loopback `host:port` through which the peer is reached locally.
    pub addr: String,
    /// `-1` unreachable, `0` unknown, `>= 1` reachable and re-affirmed n-1 times.
    pub rank: i32,
    /// Milliseconds since the Unix epoch.
    pub last_checked: i64,
}

impl PeerRecord {
    pub fn is_reachable(&self) -> bool {
        self.rank > RANK_NEUTRAL
    }
}

/// Milliseconds since the Unix epoch.
pub fn current_time_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Peer registry, shared between the façade, discovery jobs and the API.
///
/// Keyed on peer ID. Every access goes through the map's entry locks, so a
/// reader never sees a half-written record. There is no removal: records are
/// only ever overwritten by a newer check.
#[derive(Clone, Default)]
pub struct PeerRegistry {
    peers: Arc<DashMap<String, PeerRecord>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or wholesale replace the record for `record.id`.
    pub fn upsert(&self, record: PeerRecord) {
        self.peers.insert(record.id.clone(), record);
    }

    pub fn get(&self, id: &str) -> Option<PeerRecord> {
        self.peers.get(id).map(|r| r.value().clone())
    }

    /// Increment the rank of a reachable peer in place. Returns the new
    /// rank, or None if the peer is unknown or not reachable; such a peer
    /// needs a fresh check.
    pub fn bump_rank(&self, id: &str) -> Option<i32> {
        let mut record = self.peers.get_mut(id)?;
        if !record.is_reachable() {
            return None;
        }
        record.rank += 1;
        Some(record.rank)
    }

    /// Proxy addresses of every peer with rank > 0, sorted.
    pub fn reachable_peers(&self) -> Vec<String> {
        let mut addrs: Vec<String> = self
            .peers
            .iter()
            .filter(|r| r.is_reachable())
            .map(|r| r.addr.clone())
            .collect();
        addrs.sort();
        addrs
    }

    pub fn reachable_count(&self) -> usize {
        self.peers.iter().filter(|r| r.is_reachable()).count()
    }

    /// Copy of every record, sorted by peer ID.
    pub fn snapshot(&self) -> Vec<PeerRecord> {
        let mut records: Vec<PeerRecord> = self.peers.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
