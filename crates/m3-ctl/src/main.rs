//! m3-ctl — command-line interface for the m3 neighborhood daemon.

mod cmd;

use anyhow::{Context, Result};

use cmd::peers::cmd_peers;
use cmd::resolve::{cmd_proxy, cmd_resolve};
use cmd::status::cmd_status;

const DEFAULT_PORT: u16 = 18082;

fn print_usage() {
    println!("Usage: m3-ctl [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  status            Show node identity and neighborhood size");
    println!("  peers             List known peers and their ranks");
    println!("  resolve <addr>    Show the canonical form of an address");
    println!("  proxy <peer-id>   Show the local proxy address for a peer");
    println!();
    println!("Options:");
    println!("  --port <port>   API port (default: {}, or $M3D_PORT)", DEFAULT_PORT);
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut port = match std::env::var("M3D_PORT") {
        Ok(v) => v.parse().context("M3D_PORT must be a number")?,
        Err(_) => DEFAULT_PORT,
    };
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--port" {
            i += 1;
            port = args
                .get(i)
                .context("--port requires a value")?
                .parse()
                .context("--port must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["status"] | [] => cmd_status(port).await,
        ["peers"] => cmd_peers(port).await,
        ["resolve", address] => cmd_resolve(port, address).await,
        ["proxy", id] => cmd_proxy(port, id).await,
        ["help"] | ["--help"] | ["-h"] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
