//! Discovery — two periodic jobs feeding candidates into health checks.
//!
//! - pals:  the configured pal IDs, every `pals_interval_secs`
//! - swarm: peers the swarm currently sees, every `swarm_interval_secs`,
//!          skipped while the reachable count is at `max_peers`
//!
//! A candidate already reachable is re-affirmed by bumping its rank in place.
//! An unknown or unreachable one goes to the job's worker pool for a full
//! check, so a dead peer only comes back after a probe succeeds.
//! Both jobs do nothing until the node identity is known.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, Span};

use m3_core::config::DiscoveryConfig;

use crate::neighborhood::Neighborhood;
use crate::pool::WorkerPool;

pub struct DiscoveryScheduler {
    neighborhood: Arc<Neighborhood>,
    pals_pool: WorkerPool,
    swarm_pool: WorkerPool,
    pals_interval: Duration,
    swarm_interval: Duration,
    span: Span,
}

impl DiscoveryScheduler {
    /// Build the scheduler and start its worker pools. Must run inside a
    /// tokio runtime.
    pub fn new(neighborhood: Arc<Neighborhood>, config: &DiscoveryConfig) -> Self {
        let span = tracing::info_span!(parent: neighborhood.span(), "discovery");
        let pals_pool = WorkerPool::spawn(
            "pals",
            config.pals_workers,
            neighborhood.checker().clone(),
            neighborhood.registry().clone(),
            tracing::info_span!(parent: &span, "pool", name = "pals"),
        );
        let swarm_pool = WorkerPool::spawn(
            "swarm",
            config.swarm_workers,
            neighborhood.checker().clone(),
            neighborhood.registry().clone(),
            tracing::info_span!(parent: &span, "pool", name = "swarm"),
        );
        Self {
            neighborhood,
            pals_pool,
            swarm_pool,
            pals_interval: Duration::from_secs(config.pals_interval_secs.max(1)),
            swarm_interval: Duration::from_secs(config.swarm_interval_secs.max(1)),
            span,
        }
    }

    /// Run both jobs on their timers. The first tick of each fires at once.
    pub fn spawn(self: Arc<Self>) -> (JoinHandle<()>, JoinHandle<()>) {
        let pals = {
            let this = self.clone();
            tokio::spawn(
                async move {
                    let mut interval = tokio::time::interval(this.pals_interval);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        interval.tick().await;
                        this.pals_cycle().await;
                    }
                }
                .instrument(self.span.clone()),
            )
        };
        let swarm = {
            let this = self.clone();
            tokio::spawn(
                async move {
                    let mut interval = tokio::time::interval(this.swarm_interval);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        interval.tick().await;
                        this.swarm_cycle().await;
                    }
                }
                .instrument(self.span.clone()),
            )
        };
        (pals, swarm)
    }

    /// One pass over the configured pals. Returns how many were queued for
    /// a check.
    pub async fn pals_cycle(&self) -> usize {
        if !self.neighborhood.is_ready() {
            return 0;
        }
        let pals = self.neighborhood.pals();
        tracing::debug!(parent: &self.span, count = pals.len(), "pals cycle");
        self.dispatch(pals.iter().map(String::as_str), &self.pals_pool)
            .await
    }

    /// One pass over the swarm listing. Returns how many peers were queued
    /// for a check.
    pub async fn swarm_cycle(&self) -> usize {
        if !self.neighborhood.is_ready() {
            return 0;
        }

        let reachable = self.neighborhood.registry().reachable_count();
        let max = self.neighborhood.max_peers();
        if reachable >= max {
            tracing::debug!(parent: &self.span, reachable, max, "neighborhood full, no new peers");
            return 0;
        }
        if reachable < self.neighborhood.min_peers() {
            tracing::info!(
                parent: &self.span,
                reachable,
                min = self.neighborhood.min_peers(),
                "neighborhood below minimum"
            );
        }

        let peers = match self.neighborhood.swarm().list_swarm_peers().await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(parent: &self.span, error = %e, "swarm listing failed, skipping cycle");
                return 0;
            }
        };
        tracing::debug!(parent: &self.span, count = peers.len(), "swarm cycle");

        self.dispatch(
            peers.iter().map(|p| p.peer_id.as_str()),
            &self.swarm_pool,
        )
        .await
    }

    async fn dispatch<'a>(
        &self,
        ids: impl Iterator<Item = &'a str>,
        pool: &WorkerPool,
    ) -> usize {
        let registry = self.neighborhood.registry();
        let mut queued = 0;
        for id in ids {
            if let Some(rank) = registry.bump_rank(id) {
                tracing::trace!(parent: &self.span, peer = %id, rank, "peer re-affirmed");
                continue;
            }
            if let Err(e) = pool.submit(id, self.neighborhood.is_self(id)).await {
                tracing::warn!(parent: &self.span, error = %e, "dropping rest of cycle");
                break;
            }
            queued += 1;
        }
        if queued > 0 {
            tracing::debug!(parent: &self.span, pool = pool.name(), queued, "candidates queued");
        }
        queued
    }
}
