//! # Network Store
//!
//! In-memory registry of networks, keyed by id. All status and topology
//! mutations go through [`NetworkStore::update`] so reads always see a
//! consistent snapshot; operations on distinct networks never contend
//! beyond the brief map lock.

use shared_types::{LabError, Network, NetworkId, Status};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Owner of every network in the lab session.
#[derive(Default)]
pub struct NetworkStore {
    networks: Mutex<HashMap<NetworkId, Network>>,
    next_id: AtomicU64,
}

impl NetworkStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            networks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a new empty network and return its id.
    pub fn create(&self, name: impl Into<String>) -> NetworkId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.networks
            .lock()
            .unwrap()
            .insert(id, Network::new(id, name));
        id
    }

    /// Snapshot of one network.
    pub fn get(&self, id: NetworkId) -> Result<Network, LabError> {
        self.networks
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(LabError::NetworkNotFound(id))
    }

    /// Snapshot of all networks, in id order.
    #[must_use]
    pub fn list(&self) -> Vec<Network> {
        let mut networks: Vec<_> = self.networks.lock().unwrap().values().cloned().collect();
        networks.sort_by_key(|n| n.id);
        networks
    }

    /// Mutate one network under the lock and return the closure's value.
    pub fn update<F, R>(&self, id: NetworkId, mutate: F) -> Result<R, LabError>
    where
        F: FnOnce(&mut Network) -> R,
    {
        let mut networks = self.networks.lock().unwrap();
        let network = networks.get_mut(&id).ok_or(LabError::NetworkNotFound(id))?;
        Ok(mutate(network))
    }

    /// Remove a network entirely.
    pub fn remove(&self, id: NetworkId) -> Result<Network, LabError> {
        self.networks
            .lock()
            .unwrap()
            .remove(&id)
            .ok_or(LabError::NetworkNotFound(id))
    }

    /// Set one node's status (any category) and error message, then
    /// refresh the network's aggregate status. Late writes win: a status
    /// update racing a concurrent stop simply applies in arrival order.
    pub fn set_node_status(
        &self,
        id: NetworkId,
        node_name: &str,
        status: Status,
        error_message: Option<String>,
    ) -> Result<(), LabError> {
        self.update(id, |network| {
            if let Some(node) = network.chain.iter_mut().find(|n| n.name == node_name) {
                node.status = status;
                node.error_message = error_message;
            } else if let Some(node) =
                network.lightning.iter_mut().find(|n| n.name == node_name)
            {
                node.status = status;
                node.error_message = error_message;
            } else if let Some(node) = network.tap.iter_mut().find(|n| n.name == node_name) {
                node.status = status;
                node.error_message = error_message;
            }
            network.status = network.aggregate_status();
        })
    }

    /// Set the status of the network and every node in it.
    pub fn set_all_statuses(&self, id: NetworkId, status: Status) -> Result<(), LabError> {
        self.update(id, |network| {
            network.status = status;
            for node in &mut network.chain {
                node.status = status;
            }
            for node in &mut network.lightning {
                node.status = status;
            }
            for node in &mut network.tap {
                node.status = status;
            }
        })
    }
}
