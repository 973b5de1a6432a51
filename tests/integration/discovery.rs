use std::time::Duration;

use m3_services::swarm::testing::FakeSwarm;

use crate::infra::*;

#[tokio::test]
async fn bootstrap_then_pals_and_swarm_fill_the_neighborhood() {
    let me = peer_id(1);
    let pal = peer_id(2);
    let seen = peer_id(3);
    let dead = peer_id(4);

    let swarm = FakeSwarm::with_identity(&me);
    swarm.add_peer(&pal, true);
    swarm.add_peer(&seen, true);
    swarm.add_peer(&dead, false);
    swarm.set_listed(&[seen.as_str(), dead.as_str()]);

    let mut config = test_config();
    config.neighborhood.pals = vec![pal.clone()];
    let node = start_node(swarm, &config).await.unwrap();
    let nb = &node.neighborhood;

    assert_eq!(nb.self_id(), Some(me.as_str()));
    assert_eq!(nb.list_reachable_peers().len(), 1);

    assert_eq!(node.scheduler.pals_cycle().await, 1);
    assert_eq!(node.scheduler.swarm_cycle().await, 2);
    wait_until(Duration::from_secs(5), || nb.registry().len() == 4)
        .await
        .unwrap();

    assert_eq!(nb.list_reachable_peers().len(), 3);
    assert!(nb.registry().get(&pal).unwrap().is_reachable());
    assert!(nb.registry().get(&seen).unwrap().is_reachable());
    assert!(!nb.registry().get(&dead).unwrap().is_reachable());

    // The dead peer's circuit was torn down; the live ones stay open.
    let open: Vec<String> = node.swarm.open_circuits().into_iter().map(|(_, id)| id).collect();
    assert!(open.contains(&pal) && open.contains(&seen));
    assert!(!open.contains(&dead));
    assert_eq!(node.swarm.closed_circuits().len(), 1);
}

#[tokio::test]
async fn known_peers_are_bumped_not_rechecked() {
    let me = peer_id(1);
    let pal = peer_id(2);
    let swarm = FakeSwarm::with_identity(&me);
    swarm.add_peer(&pal, true);
    let mut config = test_config();
    config.neighborhood.pals = vec![pal.clone()];
    let node = start_node(swarm, &config).await.unwrap();
    let nb = &node.neighborhood;

    node.scheduler.pals_cycle().await;
    wait_until(Duration::from_secs(5), || nb.registry().get(&pal).is_some())
        .await
        .unwrap();
    let probes = node.swarm.probes();

    for _ in 0..3 {
        assert_eq!(node.scheduler.pals_cycle().await, 0);
    }
    assert_eq!(node.swarm.probes(), probes);
    assert_eq!(nb.registry().get(&pal).unwrap().rank, 4);
}

#[tokio::test]
async fn full_neighborhood_skips_swarm_listing() {
    let me = peer_id(1);
    let swarm = FakeSwarm::with_identity(&me);
    for fill in 2..6 {
        swarm.add_peer(&peer_id(fill), true);
    }
    let mut config = test_config();
    config.neighborhood.max_peers = 3;
    let node = start_node(swarm, &config).await.unwrap();
    let nb = &node.neighborhood;

    node.scheduler.swarm_cycle().await;
    wait_until(Duration::from_secs(5), || nb.registry().len() == 5)
        .await
        .unwrap();
    assert_eq!(nb.registry().reachable_count(), 5);
    assert_eq!(node.swarm.list_calls(), 1);

    assert_eq!(node.scheduler.swarm_cycle().await, 0);
    assert_eq!(node.swarm.list_calls(), 1);
}

#[tokio::test]
async fn listing_failure_leaves_registry_untouched() {
    let me = peer_id(1);
    let swarm = FakeSwarm::with_identity(&me);
    swarm.add_peer(&peer_id(2), true);
    swarm.set_listing_fails(true);
    let node = start_node(swarm, &test_config()).await.unwrap();

    assert_eq!(node.scheduler.swarm_cycle().await, 0);
    assert_eq!(node.neighborhood.registry().len(), 1);
}

#[tokio::test]
async fn bootstrap_fails_without_identity() {
    let result = start_node(FakeSwarm::default(), &test_config()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn dead_pal_stays_out_of_reachable_set() {
    let me = peer_id(1);
    let dead = peer_id(9);
    let swarm = FakeSwarm::with_identity(&me);
    swarm.add_peer(&dead, false);
    let mut config = test_config();
    config.neighborhood.pals = vec![dead.clone()];
    let node = start_node(swarm, &config).await.unwrap();
    let nb = &node.neighborhood;
    let own = nb.list_reachable_peers();

    for cycle in 1..=3 {
        node.scheduler.pals_cycle().await;
        wait_until(Duration::from_secs(5), || {
            node.swarm.closed_circuits().len() == cycle && nb.registry().get(&dead).is_some()
        })
        .await
        .unwrap();
        assert!(!nb.registry().get(&dead).unwrap().is_reachable());
        assert_eq!(nb.list_reachable_peers(), own);
    }
    assert_eq!(node.swarm.probes(), 4);
    assert!(node.swarm.open_circuits().is_empty());
}
