use m3_services::swarm::testing::FakeSwarm;

use crate::infra::*;

#[tokio::test]
async fn addresses_resolve_through_the_neighborhood() {
    let me = peer_id(1);
    let other = peer_id(2);
    let mut config = test_config();
    config.network.web_port = 8088;
    config
        .neighborhood
        .aliases
        .insert("wiki".to_string(), "docs.example.org".to_string());
    config
        .neighborhood
        .aliases
        .insert("buddy".to_string(), other.clone());
    let node = start_node(FakeSwarm::with_identity(&me), &config).await.unwrap();
    let nb = &node.neighborhood;

    let my_label = nb.peer_label(&me).unwrap();
    let other_label = nb.peer_label(&other).unwrap();
    assert_eq!(my_label, my_label.to_lowercase());

    // loopback and home are returned unchanged
    assert_eq!(nb.resolve("localhost"), "localhost");
    assert_eq!(nb.resolve("127.0.0.1"), "127.0.0.1");
    assert_eq!(nb.resolve("www.home"), "www.home");

    // aliases
    assert_eq!(nb.resolve("wiki.a"), "docs.example.org");
    assert_eq!(nb.resolve("nope.a"), "nope.a");
    assert!(nb.is_remote_peer("buddy.a"));

    // own label → home, both encodings
    assert_eq!(nb.resolve(&my_label), "home");
    assert_eq!(nb.resolve(&format!("git.{me}")), "git.home");
    assert!(nb.is_home_node(&format!("www.{my_label}")));

    // remote label → canonical ID
    assert_eq!(nb.resolve(&format!("www.{other_label}")), format!("www.{other}"));
    assert!(nb.is_remote_peer(&format!("www.{other_label}")));
    assert!(!nb.is_home_node(&format!("www.{other_label}")));

    // ordinary hosts
    assert_eq!(nb.resolve("example.com"), "example.com");
    assert!(!nb.is_remote_peer("example.com"));

    // proxy lookups
    assert_eq!(nb.proxy_address_for(&me).as_deref(), Some("localhost:8088"));
    assert_eq!(nb.proxy_address_for(&other), None);
}
