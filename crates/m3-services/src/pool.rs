//! Bounded health-check worker pool.
//!
//! Producer → bounded queue → dispatcher → at most `capacity` concurrent
//! checks. `submit` waits while the queue is full, so a burst of candidates
//! is throttled instead of dropped or buffered without limit.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{Instrument, Span};

use crate::forward::ForwardTarget;
use crate::health::HealthChecker;
use crate::peer::PeerRegistry;

/// A candidate peer ID, and whether it names this node.
struct Candidate {
    id: String,
    local: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("worker pool {0} is shut down")]
pub struct PoolClosed(pub &'static str);

pub struct WorkerPool {
    name: &'static str,
    tx: mpsc::Sender<Candidate>,
    dispatcher: JoinHandle<()>,
}

impl WorkerPool {
    /// Start the dispatcher. Results are written to `registry`.
    pub fn spawn(
        name: &'static str,
        capacity: usize,
        checker: Arc<HealthChecker>,
        registry: PeerRegistry,
        span: Span,
    ) -> Self {
        let capacity = capacity.max(1);
        let (tx, mut rx) = mpsc::channel::<Candidate>(capacity);
        let semaphore = Arc::new(Semaphore::new(capacity));

        tracing::debug!(parent: &span, pool = name, capacity, "worker pool started");

        let dispatcher = tokio::spawn(
            async move {
                while let Some(candidate) = rx.recv().await {
                    let permit = match semaphore.clone().acquire_owned().await {
                        Ok(p) => p,
                        Err(_) => break, // semaphore closed
                    };

                    let checker = checker.clone();
                    let registry = registry.clone();

                    tokio::spawn(
                        async move {
                            let target = if candidate.local {
                                ForwardTarget::Local
                            } else {
                                ForwardTarget::Remote(&candidate.id)
                            };
                            let record = checker.check(&candidate.id, target).await;
                            registry.upsert(record);
                            drop(permit);
                        }
                        .in_current_span(),
                    );
                }
                tracing::debug!(pool = name, "worker pool drained");
            }
            .instrument(span),
        );

        Self {
            name,
            tx,
            dispatcher,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Queue `id` for a check; `local` when it is this node's own ID.
    /// Waits while the queue is full.
    pub async fn submit(&self, id: &str, local: bool) -> Result<(), PoolClosed> {
        self.tx
            .send(Candidate {
                id: id.to_string(),
                local,
            })
            .await
            .map_err(|_| PoolClosed(self.name))
    }

    /// Free queue slots right now.
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}
