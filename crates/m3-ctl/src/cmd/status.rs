//! Daemon status command.

use anyhow::Result;
use serde::Deserialize;

use super::http::{base_url, get_json};

#[derive(Deserialize)]
struct StatusResponse {
    self_id: Option<String>,
    ready: bool,
    known_peers: usize,
    reachable_peers: usize,
    max_peers: usize,
}

pub async fn cmd_status(port: u16) -> Result<()> {
    let resp: StatusResponse = get_json(&format!("{}/status", base_url(port))).await?;

    println!("═══════════════════════════════════════");
    println!("  m3 Neighborhood Status");
    println!("═══════════════════════════════════════");
    println!(
        "  Node ID         : {}",
        resp.self_id.as_deref().unwrap_or("(unknown)")
    );
    println!("  Ready           : {}", if resp.ready { "yes" } else { "no" });
    println!("  Known peers     : {}", resp.known_peers);
    println!(
        "  Reachable peers : {} / {}",
        resp.reachable_peers, resp.max_peers
    );

    Ok(())
}
