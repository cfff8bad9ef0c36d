//! Per-node pending resource bookkeeping

use crate::error::ResourceError;
use crate::resources::ResourceCounter;
use k8s_openapi::api::core::v1::Pod;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Resources reserved on each node and not yet reflected in its topology
///
/// Every operation takes the same lock. Critical sections are small map
/// updates; pod limits are summed before the lock is taken.
#[derive(Debug, Default)]
pub struct PendingResourceTracker {
    nodes: Mutex<HashMap<String, ResourceCounter>>,
}

impl PendingResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ResourceCounter>> {
        // The map is consistent between statements, a panicking holder
        // cannot leave it half-updated.
        self.nodes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add the pod's resource limits to the node's pending set
    pub fn add_from_pod(&self, node: &str, pod: &Pod) {
        let counter = ResourceCounter::from_pod(pod);
        self.lock().entry(node.to_string()).or_default().add(&counter);
    }

    /// Remove the pod's resource limits from the node's pending set
    ///
    /// The returned errors describe accounting mismatches; resources that
    /// could not be subtracted are left unchanged. An unknown node is
    /// treated as an empty pending set and no entry is created for it.
    pub fn remove_from_pod(&self, node: &str, pod: &Pod) -> Vec<ResourceError> {
        let counter = ResourceCounter::from_pod(pod);
        let mut nodes = self.lock();
        match nodes.get_mut(node) {
            Some(pending) => pending.sub_with_checks(&counter),
            None => ResourceCounter::new().sub_with_checks(&counter),
        }
    }

    /// Forget everything pending on the node
    ///
    /// Returns whether the node had an entry.
    pub fn flush(&self, node: &str) -> bool {
        self.lock().remove(node).is_some()
    }

    /// Copy of the node's pending set; empty if none
    pub fn get(&self, node: &str) -> ResourceCounter {
        self.lock().get(node).cloned().unwrap_or_default()
    }

    /// Number of nodes with a pending entry, zero-valued entries included
    pub fn node_count(&self) -> usize {
        self.lock().len()
    }
}
