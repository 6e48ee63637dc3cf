//! Event-driven reconciliation flows: channel events and mined blocks
//! published on the shared bus end up as refreshed channel projections.

#[cfg(test)]
mod tests {
    use crate::integration::support::{harness, seed_network, Harness};
    use shared_bus::{ChannelEventKind, EventFilter, EventPublisher, EventTopic, LabEvent};
    use shared_types::{AutoMineMode, LightningImplementation, NetworkId, Sats};
    use std::sync::Arc;
    use std::time::Duration;
    use voltlab_lightning::{ChannelInfo, ChannelStatus};
    use voltlab_orchestrator::{ChannelReconciler, ProjectionCache};

    fn open_channel(remote: &str) -> ChannelInfo {
        ChannelInfo {
            channel_point: "fundingtx:0".to_string(),
            remote_pubkey: format!("02{remote}"),
            capacity: Sats(100_000),
            local_balance: Sats(60_000),
            remote_balance: Sats(40_000),
            status: ChannelStatus::Open,
            is_private: false,
        }
    }

    /// Start the network and attach a reconciler to the harness bus.
    async fn started_with_reconciler(h: &Harness) -> (NetworkId, Arc<ProjectionCache>) {
        let id = seed_network(
            &h.store,
            &["backend1"],
            &[("alice", LightningImplementation::Lnd)],
        );
        h.orchestrator.start(id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let cache = Arc::new(ProjectionCache::new());
        let reconciler = Arc::new(ChannelReconciler::new(
            Arc::clone(&h.store),
            Arc::clone(&h.chain_factory),
            Arc::clone(&h.lightning_factory),
            Arc::clone(&cache),
        ));
        reconciler.run(h.bus.subscribe(EventFilter::topics(vec![
            EventTopic::Chain,
            EventTopic::Channel,
        ])));
        (id, cache)
    }

    #[tokio::test(start_paused = true)]
    async fn test_channel_event_refreshes_projection() {
        let h = harness();
        let (id, cache) = started_with_reconciler(&h).await;
        h.lightning.set_channels("alice", vec![open_channel("bob")]);

        h.bus
            .publish(LabEvent::ChannelObserved {
                network_id: id,
                node: "alice".to_string(),
                implementation: LightningImplementation::Lnd,
                kind: ChannelEventKind::Open,
            })
            .await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        let channels = cache.channels(id, "alice");
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].remote_pubkey, "02bob");
        assert_eq!(channels[0].status, ChannelStatus::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mined_block_refreshes_projection() {
        let h = harness();
        let (id, cache) = started_with_reconciler(&h).await;
        h.lightning.set_channels("alice", vec![open_channel("bob")]);

        h.bus
            .publish(LabEvent::BlockMined {
                network_id: id,
                blocks: 1,
                node: "backend1".to_string(),
            })
            .await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(cache.channels(id, "alice").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_channel_event_is_dropped() {
        let h = harness();
        let (id, cache) = started_with_reconciler(&h).await;
        h.lightning.set_channels("alice", vec![open_channel("bob")]);

        h.bus
            .publish(LabEvent::ChannelObserved {
                network_id: id,
                node: "alice".to_string(),
                implementation: LightningImplementation::Lnd,
                kind: ChannelEventKind::Unknown,
            })
            .await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(cache.channels(id, "alice").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_mine_tick_refreshes_chain_projection() {
        let h = harness();
        let (id, cache) = started_with_reconciler(&h).await;
        assert!(cache.chain_info(id, "backend1").is_none());

        h.orchestrator
            .set_auto_mine(id, AutoMineMode::Interval(10))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(12)).await;

        // The startup mine plus one tick, observed through the rebuilt
        // chain-info projection.
        let info = cache.chain_info(id, "backend1").unwrap();
        assert_eq!(info.blocks, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_stop_clears_projections() {
        let h = harness();
        let (id, cache) = started_with_reconciler(&h).await;
        h.lightning.set_channels("alice", vec![open_channel("bob")]);

        h.bus
            .publish(LabEvent::ChannelObserved {
                network_id: id,
                node: "alice".to_string(),
                implementation: LightningImplementation::Lnd,
                kind: ChannelEventKind::Pending,
            })
            .await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(cache.channels(id, "alice").len(), 1);

        h.orchestrator.stop(id).await.unwrap();
        cache.clear_network(id);
        assert!(cache.channels(id, "alice").is_empty());
    }
}
