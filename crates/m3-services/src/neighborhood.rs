//! Neighborhood — this node's view of the peers it can reach.
//!
//! Owns the peer registry and the node identity. Startup obtains the
//! identity from the swarm and checks the node itself; discovery jobs
//! (see `discovery`) fill in everyone else. External callers resolve
//! addresses and look up proxy addresses through this type only.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::Span;

use m3_core::config::{DiscoveryConfig, M3Config, NeighborhoodConfig};
use m3_core::resolve::{self as resolver, is_home, is_peer};
use m3_core::PeerIdCodec;

use crate::discovery::DiscoveryScheduler;
use crate::forward::ForwardTarget;
use crate::health::HealthChecker;
use crate::peer::{PeerRecord, PeerRegistry};
use crate::swarm::{Swarm, SwarmError};

#[derive(Debug, thiserror::Error)]
pub enum NeighborhoodError {
    #[error("cannot obtain node identity from the swarm: {0}")]
    IdentityUnavailable(#[source] SwarmError),
}

/// Handles of the discovery jobs started by [`Neighborhood::start`].
pub struct Running {
    pub scheduler: Arc<DiscoveryScheduler>,
    pub pals: JoinHandle<()>,
    pub swarm: JoinHandle<()>,
}

pub struct Neighborhood {
    registry: PeerRegistry,
    identity: OnceLock<String>,
    config: NeighborhoodConfig,
    web_port: u16,
    swarm: Arc<dyn Swarm>,
    codec: Arc<dyn PeerIdCodec>,
    checker: Arc<HealthChecker>,
    span: Span,
}

impl Neighborhood {
    pub fn new(
        config: &M3Config,
        swarm: Arc<dyn Swarm>,
        codec: Arc<dyn PeerIdCodec>,
        span: Span,
    ) -> Self {
        let checker = HealthChecker::new(
            swarm.clone(),
            config.network.proxy_port,
            Duration::from_secs(config.discovery.probe_timeout_secs),
            tracing::info_span!(parent: &span, "health"),
        );
        Self {
            registry: PeerRegistry::new(),
            identity: OnceLock::new(),
            config: config.neighborhood.clone(),
            web_port: config.network.web_port,
            swarm,
            codec,
            checker: Arc::new(checker),
            span,
        }
    }

    /// Obtain the node identity and register the node itself.
    ///
    /// Fails only when the swarm cannot tell us who we are; the node is not
    /// usable in that case. Calling it again after success is a no-op.
    pub async fn bootstrap(&self) -> Result<&str, NeighborhoodError> {
        if let Some(id) = self.identity.get() {
            return Ok(id.as_str());
        }

        let id = self
            .swarm
            .self_identity()
            .await
            .map_err(NeighborhoodError::IdentityUnavailable)?;
        let id = self.identity.get_or_init(|| id);
        tracing::info!(parent: &self.span, node = %id, "node identity established");

        let record = self.checker.check(id, ForwardTarget::Local).await;
        if !record.is_reachable() {
            tracing::warn!(parent: &self.span, addr = %record.addr, "own proxy is not answering");
        }
        self.registry.upsert(record);
        Ok(id.as_str())
    }

    /// Bootstrap, then start both discovery jobs.
    pub async fn start(
        self: &Arc<Self>,
        discovery: &DiscoveryConfig,
    ) -> Result<Running, NeighborhoodError> {
        self.bootstrap().await?;
        let scheduler = Arc::new(DiscoveryScheduler::new(self.clone(), discovery));
        let (pals, swarm) = scheduler.clone().spawn();
        Ok(Running {
            scheduler,
            pals,
            swarm,
        })
    }

    /// True once the node identity is known.
    pub fn is_ready(&self) -> bool {
        self.identity.get().is_some()
    }

    pub fn self_id(&self) -> Option<&str> {
        self.identity.get().map(String::as_str)
    }

    pub fn is_self(&self, id: &str) -> bool {
        self.self_id() == Some(id)
    }

    /// Proxy addresses of every reachable peer, this node included.
    pub fn list_reachable_peers(&self) -> Vec<String> {
        self.registry.reachable_peers()
    }

    /// Every known peer record, reachable or not.
    pub fn peers(&self) -> Vec<PeerRecord> {
        self.registry.snapshot()
    }

    /// Where local callers reach `id`: the web front for this node, the
    /// registered forward for a known peer, None otherwise.
    pub fn proxy_address_for(&self, id: &str) -> Option<String> {
        if self.is_self(id) {
            return Some(format!("localhost:{}", self.web_port));
        }
        self.registry.get(id).map(|r| r.addr)
    }

    /// Canonical form of `address` for this node.
    pub fn resolve(&self, address: &str) -> String {
        resolver::resolve(
            address,
            self.self_id().unwrap_or_default(),
            &self.config.aliases,
            self.codec.as_ref(),
        )
    }

    /// Does `address` name this node (as opposed to plain loopback)?
    pub fn is_home_node(&self, address: &str) -> bool {
        is_home(&self.resolve(address))
    }

    /// Does `address` name another swarm peer?
    pub fn is_remote_peer(&self, address: &str) -> bool {
        is_peer(&self.resolve(address), self.codec.as_ref())
    }

    /// Host-label form of a peer ID, for building addresses.
    pub fn peer_label(&self, id: &str) -> Option<String> {
        self.codec.canonical_form(id)
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    pub fn checker(&self) -> &Arc<HealthChecker> {
        &self.checker
    }

    pub fn swarm(&self) -> &Arc<dyn Swarm> {
        &self.swarm
    }

    pub fn pals(&self) -> &[String] {
        &self.config.pals
    }

    pub fn min_peers(&self) -> usize {
        self.config.min_peers
    }

    pub fn max_peers(&self) -> usize {
        self.config.max_peers
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}
