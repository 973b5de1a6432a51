//! Address resolution and proxy lookup commands.

use anyhow::Result;
use serde::Deserialize;

use super::http::{base_url, get_json, get_json_opt};

#[derive(Deserialize)]
struct ResolveResponse {
    address: String,
    resolved: String,
    home: bool,
    remote: bool,
}

#[derive(Deserialize)]
struct ProxyResponse {
    id: String,
    proxy: String,
}

pub async fn cmd_resolve(port: u16, address: &str) -> Result<()> {
    let resp: ResolveResponse =
        get_json(&format!("{}/resolve/{}", base_url(port), address)).await?;

    let kind = match (resp.home, resp.remote) {
        (true, _) => "this node",
        (_, true) => "remote peer",
        _ => "plain host",
    };
    println!("{} → {} ({})", resp.address, resp.resolved, kind);
    Ok(())
}

pub async fn cmd_proxy(port: u16, id: &str) -> Result<()> {
    match get_json_opt::<ProxyResponse>(&format!("{}/proxy/{}", base_url(port), id)).await? {
        Some(resp) => println!("{} → {}", resp.id, resp.proxy),
        None => {
            eprintln!("Peer {} is not known to the neighborhood.", id);
            std::process::exit(1);
        }
    }
    Ok(())
}
