//! Shared harness: peer IDs, neighborhoods over a scripted swarm, polling.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::Span;

use m3_core::config::M3Config;
use m3_core::MultihashCodec;
use m3_services::swarm::testing::FakeSwarm;
use m3_services::{DiscoveryScheduler, Neighborhood};

/// A valid base58 sha2-256 peer ID whose digest is `fill` repeated.
pub fn peer_id(fill: u8) -> String {
    let mut mh = vec![0x12, 0x20];
    mh.extend_from_slice(&[fill; 32]);
    bs58::encode(mh).into_string()
}

/// Config with short probe timeouts suitable for tests.
pub fn test_config() -> M3Config {
    let mut config = M3Config::default();
    config.discovery.probe_timeout_secs = 1;
    config
}

pub struct Node {
    pub swarm: Arc<FakeSwarm>,
    pub neighborhood: Arc<Neighborhood>,
    pub scheduler: DiscoveryScheduler,
}

/// A bootstrapped node over `swarm`.
pub async fn start_node(swarm: FakeSwarm, config: &M3Config) -> Result<Node> {
    let swarm = Arc::new(swarm);
    let neighborhood = Arc::new(Neighborhood::new(
        config,
        swarm.clone(),
        Arc::new(MultihashCodec),
        Span::none(),
    ));
    neighborhood.bootstrap().await?;
    let scheduler = DiscoveryScheduler::new(neighborhood.clone(), &config.discovery);
    Ok(Node {
        swarm,
        neighborhood,
        scheduler,
    })
}

/// Poll `cond` every 10ms until it holds or `within` elapses.
pub async fn wait_until(within: Duration, mut cond: impl FnMut() -> bool) -> Result<()> {
    let deadline = tokio::time::Instant::now() + within;
    while !cond() {
        if tokio::time::Instant::now() >= deadline {
            bail!("condition not met within {within:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    Ok(())
}
