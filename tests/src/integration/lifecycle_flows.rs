//! End-to-end lifecycle flows through the public orchestrator surface:
//! start choreography (readiness, initial mine, peer mesh, event
//! subscriptions), stop teardown, and topology edits with backend
//! re-linking.

#[cfg(test)]
mod tests {
    use crate::integration::support::{harness, seed_network};
    use shared_bus::{EventFilter, EventTopic, LabEvent};
    use shared_types::{AutoMineMode, LabError, LightningImplementation, Status};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_network_start_runs_full_choreography() {
        let h = harness();
        let id = seed_network(
            &h.store,
            &["backend1"],
            &[
                ("alice", LightningImplementation::Lnd),
                ("bob", LightningImplementation::CoreLightning),
            ],
        );

        h.orchestrator.start(id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let network = h.store.get(id).unwrap();
        assert_eq!(network.status, Status::Started);
        assert_eq!(network.chain_node("backend1").unwrap().status, Status::Started);
        assert_eq!(network.lightning_node("alice").unwrap().status, Status::Started);
        assert_eq!(network.lightning_node("bob").unwrap().status, Status::Started);

        // Exactly one block is mined after the chain barrier, the wallet
        // is ensured, and both nodes subscribe to channel events.
        assert_eq!(h.chain.mine_calls(), 1);
        assert_eq!(h.chain.ensure_wallet_calls(), 1);
        let mut subscriptions = h.lightning.subscriptions();
        subscriptions.sort();
        assert_eq!(subscriptions, vec!["alice", "bob"]);

        // Full mesh: each node connects to the other's p2p url.
        let connects = h.lightning.connect_calls();
        assert_eq!(connects.len(), 2);
        let alice_targets = &connects.iter().find(|(n, _)| n == "alice").unwrap().1;
        assert!(alice_targets[0].starts_with("02bob@127.0.0.1:"));
        let bob_targets = &connects.iter().find(|(n, _)| n == "bob").unwrap().1;
        assert!(bob_targets[0].starts_with("02alice@127.0.0.1:"));

        assert!(h.runtime.ops().contains(&format!("start_network {id}")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_node_does_not_abort_siblings() {
        let h = harness();
        let id = seed_network(
            &h.store,
            &["backend1"],
            &[
                ("alice", LightningImplementation::Lnd),
                ("bob", LightningImplementation::Eclair),
            ],
        );
        h.lightning.fail_wait("bob");

        h.orchestrator.start(id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let network = h.store.get(id).unwrap();
        assert_eq!(network.lightning_node("alice").unwrap().status, Status::Started);
        assert_eq!(network.lightning_node("bob").unwrap().status, Status::Error);
        assert!(network.lightning_node("bob").unwrap().error_message.is_some());
        assert_eq!(network.status, Status::Error);

        // Only the online node gets a channel-event subscription.
        assert_eq!(h.lightning.subscriptions(), vec!["alice"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_publishes_status_events() {
        let h = harness();
        let id = seed_network(
            &h.store,
            &["backend1"],
            &[("alice", LightningImplementation::Lnd)],
        );
        let mut lifecycle = h
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Lifecycle]));

        h.orchestrator.start(id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Chain barrier first, then the Lightning node.
        let first = lifecycle.recv().await.unwrap();
        assert!(matches!(
            first,
            LabEvent::StatusChanged { ref node, status: Status::Started, .. } if node == "backend1"
        ));
        let second = lifecycle.recv().await.unwrap();
        assert!(matches!(
            second,
            LabEvent::StatusChanged { ref node, status: Status::Started, .. } if node == "alice"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_tears_down_and_keeps_auto_mine_mode() {
        let h = harness();
        let id = seed_network(
            &h.store,
            &["backend1"],
            &[("alice", LightningImplementation::Lnd)],
        );

        h.orchestrator.start(id).await.unwrap();
        h.orchestrator.set_auto_mine(id, AutoMineMode::Interval(30)).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        h.orchestrator.stop(id).await.unwrap();

        let network = h.store.get(id).unwrap();
        assert_eq!(network.status, Status::Stopped);
        assert_eq!(network.lightning_node("alice").unwrap().status, Status::Stopped);
        assert!(h.lightning.removed_listeners().contains(&"alice".to_string()));
        assert!(!h.orchestrator.auto_miner().is_active(id));
        assert_eq!(network.auto_mine, AutoMineMode::Interval(30));

        // A later start resumes the configured mode.
        h.orchestrator.start(id).await.unwrap();
        assert!(h.orchestrator.auto_miner().is_active(id));
    }

    #[tokio::test]
    async fn test_removing_chain_node_relinks_both_dependents() {
        let h = harness();
        let id = seed_network(
            &h.store,
            &["backend1", "backend2"],
            &[
                ("alice", LightningImplementation::Lnd),
                ("bob", LightningImplementation::CoreLightning),
            ],
        );

        h.orchestrator.remove_node(id, "backend1").await.unwrap();

        let network = h.store.get(id).unwrap();
        assert!(network.chain_node("backend1").is_none());
        assert_eq!(network.lightning_node("alice").unwrap().backend_name, "backend2");
        assert_eq!(network.lightning_node("bob").unwrap().backend_name, "backend2");
        // The regenerated definition was written out.
        assert!(h.runtime.ops().contains(&format!("save_compose {id}")));
    }

    #[tokio::test]
    async fn test_removing_sole_chain_node_is_rejected() {
        let h = harness();
        let id = seed_network(
            &h.store,
            &["backend1"],
            &[("alice", LightningImplementation::Lnd)],
        );

        let err = h.orchestrator.remove_node(id, "backend1").await.unwrap_err();
        assert!(matches!(err, LabError::LastChainNode(_)));
        assert_eq!(h.store.get(id).unwrap().chain.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_node_start_is_scoped() {
        let h = harness();
        let id = seed_network(
            &h.store,
            &["backend1"],
            &[
                ("alice", LightningImplementation::Lnd),
                ("bob", LightningImplementation::CoreLightning),
            ],
        );

        h.orchestrator.start_node(id, "alice").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let network = h.store.get(id).unwrap();
        assert_eq!(network.lightning_node("alice").unwrap().status, Status::Started);
        assert_eq!(network.lightning_node("bob").unwrap().status, Status::Stopped);
        assert_eq!(network.chain_node("backend1").unwrap().status, Status::Stopped);
        // The out-of-scope chain node never triggers the initial mine.
        assert_eq!(h.chain.mine_calls(), 0);
        assert!(h.runtime.ops().contains(&format!("start_node {id} alice")));
    }
}
