//! m3-services — neighborhood subsystems: peer registry, swarm access,
//! forwarding, health checks and discovery.

pub mod discovery;
pub mod forward;
pub mod health;
pub mod neighborhood;
pub mod peer;
pub mod pool;
pub mod probe;
pub mod swarm;

pub use discovery::DiscoveryScheduler;
pub use forward::{allocate_port, ForwardError, ForwardTarget, ProxyForwarder};
pub use health::HealthChecker;
pub use neighborhood::{Neighborhood, NeighborhoodError, Running};
pub use peer::{current_time_millis, PeerRecord, PeerRegistry};
pub use pool::WorkerPool;
pub use swarm::{IpfsSwarm, Swarm, SwarmError, SwarmPeer};
