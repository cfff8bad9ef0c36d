//! Topology snapshot sources

use crate::topology::NodeResourceTopology;
use dashmap::DashMap;
use k8s_openapi::api::core::v1::Pod;
use std::sync::Arc;
use tracing::debug;

/// Read access to the latest topology snapshot of each node
pub trait TopologyLister: Send + Sync {
    fn get(&self, node: &str) -> Option<Arc<NodeResourceTopology>>;
}

/// Change notification for a node's topology object
#[derive(Debug, Clone)]
pub enum TopologyEvent {
    Added(Arc<NodeResourceTopology>),
    Updated {
        old: Arc<NodeResourceTopology>,
        new: Arc<NodeResourceTopology>,
    },
    Deleted(Arc<NodeResourceTopology>),
}

impl TopologyEvent {
    /// Name of the node the event refers to
    pub fn node_name(&self) -> &str {
        match self {
            TopologyEvent::Added(nrt) | TopologyEvent::Deleted(nrt) => &nrt.name,
            TopologyEvent::Updated { new, .. } => &new.name,
        }
    }

    /// Short event kind, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            TopologyEvent::Added(_) => "added",
            TopologyEvent::Updated { .. } => "updated",
            TopologyEvent::Deleted(_) => "deleted",
        }
    }
}

/// In-memory topology lister fed with informer events
#[derive(Debug, Default)]
pub struct TopologyStore {
    /// Map of node name -> latest snapshot
    snapshots: DashMap<String, Arc<NodeResourceTopology>>,
}

impl TopologyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or replace a node's snapshot
    pub fn upsert(&self, nrt: Arc<NodeResourceTopology>) {
        debug!(node = %nrt.name, zones = nrt.zones.len(), "Storing topology snapshot");
        self.snapshots.insert(nrt.name.clone(), nrt);
    }

    /// Drop a node's snapshot
    pub fn remove(&self, node: &str) -> Option<Arc<NodeResourceTopology>> {
        self.snapshots.remove(node).map(|(_, v)| v)
    }

    /// Bring the store in line with an informer event
    pub fn apply(&self, event: &TopologyEvent) {
        match event {
            TopologyEvent::Added(nrt) => self.upsert(Arc::clone(nrt)),
            TopologyEvent::Updated { new, .. } => self.upsert(Arc::clone(new)),
            TopologyEvent::Deleted(nrt) => {
                self.remove(&nrt.name);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl TopologyLister for TopologyStore {
    fn get(&self, node: &str) -> Option<Arc<NodeResourceTopology>> {
        self.snapshots.get(node).map(|r| Arc::clone(r.value()))
    }
}

/// Topology view used by the scheduling path
pub trait TopologyCache: Send + Sync {
    /// Topology of `node` as the scheduler should see it right now
    fn get_by_node(&self, node: &str) -> Option<Arc<NodeResourceTopology>>;

    /// The filter ruled the node out for `pod`
    fn mark_node_discarded(&self, node: &str, pod: &Pod);

    /// The pod was tentatively placed on the node
    fn reserve_node_resources(&self, node: &str, pod: &Pod);

    /// A tentative placement was undone
    fn release_node_resources(&self, node: &str, pod: &Pod);
}

/// Cache returning exactly what the lister holds; bookkeeping is a no-op
pub struct PassthroughCache {
    lister: Arc<dyn TopologyLister>,
}

impl PassthroughCache {
    pub fn new(lister: Arc<dyn TopologyLister>) -> Self {
        Self { lister }
    }
}

impl TopologyCache for PassthroughCache {
    fn get_by_node(&self, node: &str) -> Option<Arc<NodeResourceTopology>> {
        self.lister.get(node)
    }

    fn mark_node_discarded(&self, _node: &str, _pod: &Pod) {}

    fn reserve_node_resources(&self, _node: &str, _pod: &Pod) {}

    fn release_node_resources(&self, _node: &str, _pod: &Pod) {}
}
