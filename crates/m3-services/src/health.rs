//! Health checks — turns a candidate peer ID into a ranked peer record.
//!
//! Each check owns a freshly allocated loopback port for its whole life, so
//! any number of checks for distinct peers may run at once. The checker does
//! not touch the registry; the caller stores the record.

use std::sync::Arc;
use std::time::Duration;

use tracing::Span;

use crate::forward::{allocate_port, ForwardTarget, ProxyForwarder};
use crate::peer::{current_time_millis, PeerRecord, RANK_REACHABLE, RANK_UNREACHABLE};
use crate::swarm::Swarm;

pub struct HealthChecker {
    swarm: Arc<dyn Swarm>,
    forwarder: ProxyForwarder,
    probe_timeout: Duration,
    span: Span,
}

impl HealthChecker {
    pub fn new(swarm: Arc<dyn Swarm>, proxy_port: u16, probe_timeout: Duration, span: Span) -> Self {
        let forwarder = ProxyForwarder::new(
            swarm.clone(),
            proxy_port,
            tracing::debug_span!(parent: &span, "forwarder"),
        );
        Self {
            swarm,
            forwarder,
            probe_timeout,
            span,
        }
    }

    pub fn forwarder(&self) -> &ProxyForwarder {
        &self.forwarder
    }

    /// Forward a fresh port to `target` and probe it. `id` names the record.
    ///
    /// Rank 1 when the probe answers, -1 when the forward or the probe fails.
    /// A failed remote circuit is closed again; the local forward for this
    /// node is left running.
    pub async fn check(&self, id: &str, target: ForwardTarget<'_>) -> PeerRecord {
        let is_self = target == ForwardTarget::Local;

        let port = match allocate_port() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(parent: &self.span, peer = %id, error = %e, "no free port for check");
                return PeerRecord {
                    id: id.to_string(),
                    addr: "127.0.0.1:0".to_string(),
                    rank: RANK_UNREACHABLE,
                    last_checked: current_time_millis(),
                };
            }
        };
        let addr = format!("127.0.0.1:{port}");

        tracing::debug!(parent: &self.span, peer = %id, is_self, %addr, "checking peer");

        let rank = match self.forwarder.open_forward(port, target).await {
            Err(e) => {
                tracing::info!(parent: &self.span, peer = %id, error = %e, "forward failed");
                RANK_UNREACHABLE
            }
            Ok(()) => {
                if self.probe(port).await {
                    RANK_REACHABLE
                } else {
                    if let ForwardTarget::Remote(_) = target {
                        if let Err(e) = self.forwarder.close_forward(port, target).await {
                            tracing::debug!(parent: &self.span, peer = %id, error = %e, "circuit close failed");
                        }
                    }
                    RANK_UNREACHABLE
                }
            }
        };

        tracing::info!(parent: &self.span, peer = %id, is_self, %addr, rank, "peer checked");

        PeerRecord {
            id: id.to_string(),
            addr,
            rank,
            last_checked: current_time_millis(),
        }
    }

    async fn probe(&self, port: u16) -> bool {
        tokio::time::timeout(self.probe_timeout, self.swarm.probe_liveness(port))
            .await
            .unwrap_or(false)
    }
}
