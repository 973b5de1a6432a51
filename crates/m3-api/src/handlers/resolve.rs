//! /resolve/{address} and /proxy/{id} handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::ApiState;

// ── /resolve/{address} ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub address: String,
    pub resolved: String,
    pub home: bool,
    pub remote: bool,
}

pub async fn handle_resolve(
    State(state): State<ApiState>,
    Path(address): Path<String>,
) -> Json<ResolveResponse> {
    let nb = &state.neighborhood;
    let resolved = nb.resolve(&address);
    tracing::debug!(%address, %resolved, "resolve");
    Json(ResolveResponse {
        home: nb.is_home_node(&address),
        remote: nb.is_remote_peer(&address),
        address,
        resolved,
    })
}

// ── /proxy/{id} ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ProxyResponse {
    pub id: String,
    pub proxy: String,
}

pub async fn handle_proxy(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<ProxyResponse>, (StatusCode, String)> {
    let proxy = state
        .neighborhood
        .proxy_address_for(&id)
        .ok_or((StatusCode::NOT_FOUND, "peer not known".to_string()))?;
    Ok(Json(ProxyResponse { id, proxy }))
}
