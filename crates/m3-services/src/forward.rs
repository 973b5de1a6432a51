//! Proxy forwarding — exposes a peer behind a local loopback port.
//!
//! For this node the forward is an in-process TCP relay from the allocated
//! port to our own proxy listener. For a remote peer the swarm opens a
//! circuit from the port to the peer's service.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{Instrument, Span};

use crate::swarm::{Swarm, SwarmError};

/// Where a forwarded port leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardTarget<'a> {
    /// This node's own proxy listener.
    Local,
    /// A remote swarm peer, by ID.
    Remote(&'a str),
}

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("failed to bind 127.0.0.1:{0}: {1}")]
    Bind(u16, std::io::Error),
    #[error("circuit to {peer} on port {port} failed: {source}")]
    Circuit {
        port: u16,
        peer: String,
        #[source]
        source: SwarmError,
    },
}

/// Ask the OS for a free loopback port.
///
/// The probe listener is closed before returning, so the caller binds it
/// again (or hands it to the swarm).
pub fn allocate_port() -> std::io::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

pub struct ProxyForwarder {
    swarm: Arc<dyn Swarm>,
    proxy_port: u16,
    /// Relay tasks for local forwards, by local port.
    local: DashMap<u16, JoinHandle<()>>,
    span: Span,
}

impl ProxyForwarder {
    pub fn new(swarm: Arc<dyn Swarm>, proxy_port: u16, span: Span) -> Self {
        Self {
            swarm,
            proxy_port,
            local: DashMap::new(),
            span,
        }
    }

    pub async fn open_forward(
        &self,
        local_port: u16,
        target: ForwardTarget<'_>,
    ) -> Result<(), ForwardError> {
        match target {
            ForwardTarget::Local => self.open_local(local_port).await,
            ForwardTarget::Remote(peer) => {
                self.swarm
                    .open_circuit(local_port, peer)
                    .await
                    .map_err(|source| ForwardError::Circuit {
                        port: local_port,
                        peer: peer.to_string(),
                        source,
                    })?;
                tracing::debug!(parent: &self.span, port = local_port, %peer, "circuit opened");
                Ok(())
            }
        }
    }

    pub async fn close_forward(
        &self,
        local_port: u16,
        target: ForwardTarget<'_>,
    ) -> Result<(), ForwardError> {
        match target {
            ForwardTarget::Local => {
                if let Some((_, relay)) = self.local.remove(&local_port) {
                    relay.abort();
                }
                Ok(())
            }
            ForwardTarget::Remote(peer) => {
                self.swarm
                    .close_circuit(local_port, peer)
                    .await
                    .map_err(|source| ForwardError::Circuit {
                        port: local_port,
                        peer: peer.to_string(),
                        source,
                    })?;
                tracing::debug!(parent: &self.span, port = local_port, %peer, "circuit closed");
                Ok(())
            }
        }
    }

    /// Number of live local relays.
    pub fn local_forwards(&self) -> usize {
        self.local.len()
    }

    /// Bind the local port now, relay in the background for the life of the process.
    async fn open_local(&self, local_port: u16) -> Result<(), ForwardError> {
        let listener = TcpListener::bind(("127.0.0.1", local_port))
            .await
            .map_err(|e| ForwardError::Bind(local_port, e))?;
        let proxy_port = self.proxy_port;

        tracing::info!(parent: &self.span, port = local_port, proxy_port, "local forward listening");

        let relay = tokio::spawn(
            async move {
                loop {
                    let (inbound, from) = match listener.accept().await {
                        Ok(r) => r,
                        Err(e) => {
                            tracing::warn!(error = %e, "local forward accept failed");
                            continue;
                        }
                    };
                    tokio::spawn(
                        async move {
                            if let Err(e) = relay(inbound, proxy_port).await {
                                tracing::debug!(%from, error = %e, "local forward connection ended");
                            }
                        }
                        .in_current_span(),
                    );
                }
            }
            .instrument(self.span.clone()),
        );

        if let Some(old) = self.local.insert(local_port, relay) {
            old.abort();
        }
        Ok(())
    }
}

async fn relay(mut inbound: TcpStream, proxy_port: u16) -> std::io::Result<()> {
    let mut outbound = TcpStream::connect(("127.0.0.1", proxy_port)).await?;
    tokio::io::copy_bidirectional(&mut inbound, &mut outbound).await?;
    Ok(())
}
