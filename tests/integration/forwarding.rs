use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::Span;

use m3_services::probe::http_probe;
use m3_services::swarm::testing::FakeSwarm;
use m3_services::{allocate_port, ForwardTarget, ProxyForwarder};

/// A minimal HTTP server answering every request with 200.
async fn http_stub() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        loop {
            let Ok((mut sock, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = sock.read(&mut buf).await;
                let _ = sock
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
                    .await;
            });
        }
    });
    port
}

#[tokio::test]
async fn local_forward_relays_to_the_proxy() {
    let proxy_port = http_stub().await;
    let forwarder = ProxyForwarder::new(
        Arc::new(FakeSwarm::with_identity("QmSelf")),
        proxy_port,
        Span::none(),
    );

    let port = allocate_port().unwrap();
    assert!(!http_probe(port, Duration::from_millis(300)).await);

    forwarder
        .open_forward(port, ForwardTarget::Local)
        .await
        .unwrap();
    assert!(http_probe(port, Duration::from_secs(2)).await);

    forwarder
        .close_forward(port, ForwardTarget::Local)
        .await
        .unwrap();
    assert_eq!(forwarder.local_forwards(), 0);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!http_probe(port, Duration::from_millis(300)).await);
}

#[tokio::test]
async fn probe_of_silent_listener_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    // accepts but never answers
    let _hold = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((sock, _)) = listener.accept().await {
            held.push(sock);
        }
    });

    let started = tokio::time::Instant::now();
    assert!(!http_probe(port, Duration::from_millis(200)).await);
    assert!(started.elapsed() < Duration::from_secs(2));
}
