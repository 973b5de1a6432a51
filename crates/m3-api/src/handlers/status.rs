//! /status and /peers handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use m3_services::PeerRecord;

use super::ApiState;

// ── /status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub self_id: Option<String>,
    pub ready: bool,
    pub known_peers: usize,
    pub reachable_peers: usize,
    pub max_peers: usize,
}

pub async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let nb = &state.neighborhood;
    Json(StatusResponse {
        self_id: nb.self_id().map(str::to_string),
        ready: nb.is_ready(),
        known_peers: nb.registry().len(),
        reachable_peers: nb.registry().reachable_count(),
        max_peers: nb.max_peers(),
    })
}

// ── /peers ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PeersResponse {
    pub peers: Vec<PeerRecord>,
    /// Proxy addresses of the reachable peers.
    pub reachable: Vec<String>,
}

pub async fn handle_peers(State(state): State<ApiState>) -> Json<PeersResponse> {
    Json(PeersResponse {
        peers: state.neighborhood.peers(),
        reachable: state.neighborhood.list_reachable_peers(),
    })
}
