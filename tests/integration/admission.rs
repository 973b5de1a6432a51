use std::time::Duration;

use m3_services::swarm::testing::FakeSwarm;

use crate::infra::*;

#[tokio::test]
async fn swarm_checks_are_bounded_by_worker_count() {
    let me = peer_id(1);
    let swarm = FakeSwarm::with_identity(&me);
    for fill in 10..50 {
        swarm.add_peer(&peer_id(fill), fill % 2 == 0);
    }
    swarm.set_probe_delay(Duration::from_millis(20));

    let mut config = test_config();
    config.neighborhood.max_peers = 100;
    config.discovery.swarm_workers = 4;
    let node = start_node(swarm, &config).await.unwrap();
    let nb = &node.neighborhood;

    assert_eq!(node.scheduler.swarm_cycle().await, 40);
    wait_until(Duration::from_secs(10), || nb.registry().len() == 41)
        .await
        .unwrap();

    assert!(
        node.swarm.max_in_flight() <= 4,
        "max in flight {}",
        node.swarm.max_in_flight()
    );
    assert_eq!(nb.registry().reachable_count(), 21);
}

#[tokio::test]
async fn concurrent_readers_see_whole_records() {
    let me = peer_id(1);
    let swarm = FakeSwarm::with_identity(&me);
    for fill in 10..40 {
        swarm.add_peer(&peer_id(fill), true);
    }
    let mut config = test_config();
    config.neighborhood.max_peers = 100;
    let node = start_node(swarm, &config).await.unwrap();
    let nb = node.neighborhood.clone();

    let reader = {
        let nb = nb.clone();
        tokio::spawn(async move {
            for _ in 0..200 {
                for record in nb.peers() {
                    assert!(record.addr.starts_with("127.0.0.1:"));
                    assert!(record.last_checked > 0);
                }
                for addr in nb.list_reachable_peers() {
                    assert!(addr.starts_with("127.0.0.1:"));
                }
                tokio::task::yield_now().await;
            }
        })
    };

    node.scheduler.swarm_cycle().await;
    wait_until(Duration::from_secs(5), || nb.registry().len() == 31)
        .await
        .unwrap();
    reader.await.unwrap();

    let mut ids: Vec<String> = nb.peers().into_iter().map(|r| r.id).collect();
    ids.dedup();
    assert_eq!(ids.len(), 31);
}
