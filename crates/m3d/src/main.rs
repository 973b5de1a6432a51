//! m3d — neighborhood daemon for an IPFS-backed overlay node.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use m3_core::config::M3Config;
use m3_core::MultihashCodec;
use m3_services::{IpfsSwarm, Neighborhood};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    match M3Config::write_default_if_missing() {
        Ok(path) => tracing::debug!(path = %path.display(), "config file"),
        Err(e) => tracing::warn!(error = %e, "failed to write default config"),
    }
    let config = M3Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        M3Config::default()
    });
    tracing::info!(
        proxy_port = config.network.proxy_port,
        web_port = config.network.web_port,
        api_port = config.api.port,
        pals = config.neighborhood.pals.len(),
        max_peers = config.neighborhood.max_peers,
        "m3d starting"
    );

    // Swarm + neighborhood
    let swarm = Arc::new(IpfsSwarm::new(
        &config.swarm,
        Duration::from_secs(config.discovery.probe_timeout_secs),
    ));
    let neighborhood = Arc::new(Neighborhood::new(
        &config,
        swarm,
        Arc::new(MultihashCodec),
        tracing::info_span!("neighborhood"),
    ));

    // Identity, self check, discovery jobs
    let running = neighborhood
        .start(&config.discovery)
        .await
        .context("neighborhood startup failed; is the IPFS daemon running?")?;
    tracing::info!(
        node = neighborhood.self_id().unwrap_or_default(),
        "neighborhood ready"
    );

    // API
    let api_port = config.api.port;
    let state = m3_api::ApiState {
        neighborhood: neighborhood.clone(),
    };
    let api_task = tokio::spawn(m3_api::serve(state, api_port));

    // Shutdown broadcast
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Wait for exit ────────────────────────────────────────────────────────

    let result = wait_for_exit(shutdown_tx.subscribe(), running.pals, running.swarm, api_task).await;
    if let Err(e) = &result {
        tracing::error!(error = %format!("{e:#}"), "m3d exiting");
    }
    result
}

/// Wait for the shutdown signal. Any long-running task stopping first is
/// an error, so the process exits non-zero.
async fn wait_for_exit(
    mut shutdown_rx: broadcast::Receiver<()>,
    pals: JoinHandle<()>,
    swarm: JoinHandle<()>,
    api: JoinHandle<Result<()>>,
) -> Result<()> {
    tokio::select! {
        _ = shutdown_rx.recv() => {
            tracing::info!("shutting down");
            Ok(())
        }
        r = pals  => Err(anyhow!("pals discovery exited: {:?}", r)),
        r = swarm => Err(anyhow!("swarm discovery exited: {:?}", r)),
        r = api   => match r {
            Ok(Ok(())) => Err(anyhow!("API server stopped")),
            Ok(Err(e)) => Err(e.context("API server failed")),
            Err(e) => Err(anyhow::Error::new(e).context("API task aborted")),
        },
    }
}
