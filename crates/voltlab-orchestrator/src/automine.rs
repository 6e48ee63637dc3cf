//! # Auto-Mining Scheduler
//!
//! Per-network unattended mining: an enabled timer mines one block on the
//! network's first chain node every period. Enabling replaces any
//! existing timer under one lock, so two live timers for the same
//! network cannot exist. Failures stay silent - the chain adapter's
//! `BlockMined` event is what downstream consumers react to, and an
//! unattended tick must never surface a modal error. After several
//! consecutive failures a degraded-state warning is logged once.

use crate::store::NetworkStore;
use shared_types::{AutoMineMode, LabError, NetworkId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use voltlab_chain::ChainServiceFactory;

/// Consecutive tick failures before the degraded warning fires.
const DEGRADED_AFTER_FAILURES: u32 = 5;

/// Owner of the per-network mining timers.
pub struct AutoMiner {
    store: Arc<NetworkStore>,
    chain: Arc<ChainServiceFactory>,
    timers: Mutex<HashMap<NetworkId, JoinHandle<()>>>,
}

impl AutoMiner {
    /// Create a miner over the shared store and chain factory.
    pub fn new(store: Arc<NetworkStore>, chain: Arc<ChainServiceFactory>) -> Self {
        Self {
            store,
            chain,
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Apply a new auto-mine mode to a network.
    ///
    /// The old timer (if any) is cancelled and the new one installed
    /// under one lock; interval changes never leave two timers running.
    pub fn set_mode(&self, network_id: NetworkId, mode: AutoMineMode) -> Result<(), LabError> {
        self.store
            .update(network_id, |network| network.auto_mine = mode)?;

        let mut timers = self.timers.lock().unwrap();
        if let Some(previous) = timers.remove(&network_id) {
            previous.abort();
            debug!(network = network_id, "Cancelled previous auto-mine timer");
        }
        if let Some(secs) = mode.interval_secs() {
            info!(network = network_id, interval_secs = secs, "Auto-mining enabled");
            timers.insert(
                network_id,
                tokio::spawn(Self::mining_loop(
                    Arc::clone(&self.store),
                    Arc::clone(&self.chain),
                    network_id,
                    secs,
                )),
            );
        } else {
            info!(network = network_id, "Auto-mining disabled");
        }
        Ok(())
    }

    /// Cancel the timer without touching the stored mode. Used on
    /// network stop so a later start resumes the configured mode.
    pub fn clear(&self, network_id: NetworkId) {
        if let Some(timer) = self.timers.lock().unwrap().remove(&network_id) {
            timer.abort();
            debug!(network = network_id, "Auto-mine timer cleared");
        }
    }

    /// Whether a timer is live for this network.
    #[must_use]
    pub fn is_active(&self, network_id: NetworkId) -> bool {
        self.timers.lock().unwrap().contains_key(&network_id)
    }

    /// Number of live timers across all networks.
    #[must_use]
    pub fn active_timers(&self) -> usize {
        self.timers.lock().unwrap().len()
    }

    async fn mining_loop(
        store: Arc<NetworkStore>,
        chain: Arc<ChainServiceFactory>,
        network_id: NetworkId,
        interval_secs: u64,
    ) {
        let mut consecutive_failures: u32 = 0;
        loop {
            sleep(Duration::from_secs(interval_secs)).await;

            let Ok(network) = store.get(network_id) else {
                debug!(network = network_id, "Auto-mine target gone, stopping");
                return;
            };
            let Some(node) = network.chain.first().cloned() else {
                debug!(network = network_id, "No chain node to auto-mine on");
                continue;
            };

            match chain.service(&node).mine(&node, 1).await {
                Ok(_) => {
                    consecutive_failures = 0;
                }
                Err(err) => {
                    consecutive_failures += 1;
                    debug!(network = network_id, error = %err, "Auto-mine tick failed");
                    if consecutive_failures == DEGRADED_AFTER_FAILURES {
                        warn!(
                            network = network_id,
                            failures = consecutive_failures,
                            "Auto-mining degraded: repeated consecutive failures"
                        );
                    }
                }
            }
        }
    }
}

impl Drop for AutoMiner {
    fn drop(&mut self) {
        for (_, timer) in self.timers.lock().unwrap().drain() {
            timer.abort();
        }
    }
}
