//! # Channel-Event Listener Registry
//!
//! Long-lived subscription tasks, keyed by node name rather than object
//! identity so removing and re-adding a node under the same name reuses
//! the slot. Installing over an existing key aborts the old task first;
//! removal of an untracked key is a no-op.

use std::collections::HashMap;
use std::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// Owner of the per-node channel-event subscription tasks.
#[derive(Default)]
pub struct ListenerRegistry {
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the listener task for `node_name`, aborting any task
    /// already registered under that name.
    pub fn install(&self, node_name: &str, task: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().unwrap();
        if let Some(previous) = tasks.insert(node_name.to_string(), task) {
            debug!(node = node_name, "replacing existing channel-event listener");
            previous.abort();
        }
    }

    /// Abort and forget the listener for `node_name`. Idempotent.
    pub fn remove(&self, node_name: &str) {
        if let Some(task) = self.tasks.lock().unwrap().remove(node_name) {
            debug!(node = node_name, "removing channel-event listener");
            task.abort();
        }
    }

    /// Whether a listener is currently registered for `node_name`.
    #[must_use]
    pub fn contains(&self, node_name: &str) -> bool {
        self.tasks.lock().unwrap().contains_key(node_name)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    /// Whether no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().unwrap().is_empty()
    }

    /// Abort every registered listener. Used on network stop.
    pub fn clear(&self) {
        let mut tasks = self.tasks.lock().unwrap();
        for (_, task) in tasks.drain() {
            task.abort();
        }
    }
}

impl Drop for ListenerRegistry {
    fn drop(&mut self) {
        self.clear();
    }
}
