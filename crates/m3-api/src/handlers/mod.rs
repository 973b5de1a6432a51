//! HTTP API handlers — read-only JSON views of the neighborhood.

pub mod resolve;
pub mod status;

use std::sync::Arc;

use m3_services::Neighborhood;

#[derive(Clone)]
pub struct ApiState {
    pub neighborhood: Arc<Neighborhood>,
}

pub use resolve::{handle_proxy, handle_resolve};
pub use status::{handle_peers, handle_status};
