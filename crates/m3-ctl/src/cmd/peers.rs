//! Peer listing command.

use anyhow::Result;
use serde::Deserialize;

use super::http::{base_url, get_json};

#[derive(Deserialize)]
struct PeersResponse {
    peers: Vec<PeerInfo>,
    #[allow(dead_code)]
    reachable: Vec<String>,
}

#[derive(Deserialize)]
struct PeerInfo {
    id: String,
    addr: String,
    rank: i32,
    last_checked: i64,
}

fn short(id: &str) -> &str {
    id.get(..16).unwrap_or(id)
}

pub async fn cmd_peers(port: u16) -> Result<()> {
    let resp: PeersResponse = get_json(&format!("{}/peers", base_url(port))).await?;

    if resp.peers.is_empty() {
        println!("No peers known yet.");
        return Ok(());
    }

    let reachable = resp.peers.iter().filter(|p| p.rank > 0).count();
    println!("═══════════════════════════════════════");
    println!("  Peers ({} known, {} reachable)", resp.peers.len(), reachable);
    println!("═══════════════════════════════════════");

    for p in &resp.peers {
        let state = if p.rank > 0 { "reachable" } else { "down" };
        println!("  ┌─ {}", short(&p.id));
        println!("  │  proxy        : {}", p.addr);
        println!("  │  rank         : {} ({})", p.rank, state);
        println!("  └─ last check  : {} ms", p.last_checked);
    }

    Ok(())
}
