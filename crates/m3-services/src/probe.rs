//! Liveness probe for a forwarded local port.
//!
//! A swarm circuit listener accepts TCP connections whether or not the far
//! side is up, so a bare connect proves nothing. The probe sends a minimal
//! HTTP request and waits for the start of a reply.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const PROBE_REQUEST: &[u8] = b"HEAD / HTTP/1.1\r\nHost: home\r\nConnection: close\r\n\r\n";

/// True if an HTTP reply arrives on `127.0.0.1:port` within `timeout`.
pub async fn http_probe(port: u16, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, probe(port)).await {
        Ok(Ok(live)) => live,
        Ok(Err(e)) => {
            tracing::debug!(port, error = %e, "probe failed");
            false
        }
        Err(_) => {
            tracing::debug!(port, timeout_ms = timeout.as_millis() as u64, "probe timed out");
            false
        }
    }
}

async fn probe(port: u16) -> std::io::Result<bool> {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await?;
    stream.write_all(PROBE_REQUEST).await?;

    let mut buf = [0u8; 5];
    let mut read = 0;
    while read < buf.len() {
        let n = stream.read(&mut buf[read..]).await?;
        if n == 0 {
            break;
        }
        read += n;
    }
    Ok(&buf[..read] == b"HTTP/")
}
