//! Reservation-aware topology view
//!
//! Ties the pending resource tracker to the scheduler lifecycle: pods are
//! added on reserve, removed on unreserve, and a node's pending set is
//! dropped as soon as a fresh topology report for it arrives. Lookups
//! subtract whatever is still pending from the last report.

use super::cache::{TopologyCache, TopologyEvent, TopologyLister};
use super::tracker::PendingResourceTracker;
use crate::observability::{SchedulerMetrics, StructuredLogger};
use crate::resources::ResourceCounter;
use crate::topology::{adjusted, NodeResourceTopology};
use k8s_openapi::api::core::v1::Pod;
use std::sync::Arc;
use tracing::{debug, info};

/// Scheduler-facing coordinator over a topology lister
pub struct ReservationCoordinator {
    lister: Arc<dyn TopologyLister>,
    tracker: PendingResourceTracker,
    metrics: SchedulerMetrics,
    logger: StructuredLogger,
}

impl ReservationCoordinator {
    pub fn new(lister: Arc<dyn TopologyLister>, logger: StructuredLogger) -> Self {
        Self {
            lister,
            tracker: PendingResourceTracker::new(),
            metrics: SchedulerMetrics::new(),
            logger,
        }
    }

    /// Pod was tentatively placed on `node`
    pub fn reserve(&self, pod: &Pod, node: &str) {
        self.tracker.add_from_pod(node, pod);
        self.metrics.inc_reservations();
        self.metrics.set_pending_nodes(self.tracker.node_count());

        let (namespace, name) = pod_identity(pod);
        self.logger
            .log_reserve(namespace, name, node, &self.tracker.get(node));
    }

    /// Tentative placement of pod on `node` was undone
    ///
    /// Accounting mismatches are logged, never returned: a failed cleanup
    /// must not turn into a scheduling failure.
    pub fn unreserve(&self, pod: &Pod, node: &str) {
        let errors = self.tracker.remove_from_pod(node, pod);
        self.metrics.inc_unreservations();

        let (namespace, name) = pod_identity(pod);
        for err in &errors {
            debug!(
                node = %node,
                namespace = %namespace,
                pod_name = %name,
                resource = %err.resource(),
                error = %err,
                "Pending resource accounting mismatch"
            );
        }
        if !errors.is_empty() {
            self.metrics.add_reservation_errors(errors.len());
        }
        self.logger.log_unreserve(namespace, name, node, errors.len());
    }

    /// Latest topology of `node` minus what is still pending on it
    ///
    /// With nothing pending the lister's snapshot is returned as is.
    pub fn get_node_topology(&self, node: &str) -> Option<Arc<NodeResourceTopology>> {
        let nrt = self.lister.get(node)?;

        let pending = self.tracker.get(node);
        if pending.is_zero() {
            return Some(nrt);
        }

        Some(Arc::new(self.adjust(&nrt, &pending)))
    }

    fn adjust(&self, nrt: &NodeResourceTopology, pending: &ResourceCounter) -> NodeResourceTopology {
        let (copy, errors) = adjusted(nrt, pending);
        self.metrics.inc_topology_adjustments();

        for err in &errors {
            debug!(
                node = %err.node,
                zone = %err.zone,
                resource = %err.resource,
                reason = %err.reason,
                available = %err.available,
                requested = %err.requested,
                "Cannot fully adjust zone availability for pending resources"
            );
        }
        if !errors.is_empty() {
            self.metrics.add_topology_adjust_errors(errors.len());
        }

        debug!(node = %nrt.name, pending = %pending, "Adjusted topology for pending resources");
        copy
    }

    /// Fresh data for a node supersedes everything tracked for it
    pub fn handle_topology_event(&self, event: &TopologyEvent) {
        let node = event.node_name();
        if self.tracker.flush(node) {
            self.metrics.inc_topology_flushes();
            self.logger.log_flush(node, event.kind());
        }
        self.metrics.set_pending_nodes(self.tracker.node_count());
    }

    /// The filter ruled out `node` for `pod`
    pub fn mark_node_discarded(&self, node: &str, pod: &Pod) {
        let (namespace, name) = pod_identity(pod);
        info!(
            node = %node,
            namespace = %namespace,
            pod_name = %name,
            pending = %self.tracker.get(node),
            "Node discarded by topology filter"
        );
        self.metrics.inc_nodes_discarded();
    }

    /// Copy of the pending set for a node
    pub fn pending(&self, node: &str) -> ResourceCounter {
        self.tracker.get(node)
    }

    pub fn pending_node_count(&self) -> usize {
        self.tracker.node_count()
    }
}

impl TopologyCache for ReservationCoordinator {
    fn get_by_node(&self, node: &str) -> Option<Arc<NodeResourceTopology>> {
        self.get_node_topology(node)
    }

    fn mark_node_discarded(&self, node: &str, pod: &Pod) {
        ReservationCoordinator::mark_node_discarded(self, node, pod);
    }

    fn reserve_node_resources(&self, node: &str, pod: &Pod) {
        self.reserve(pod, node);
    }

    fn release_node_resources(&self, node: &str, pod: &Pod) {
        self.unreserve(pod, node);
    }
}

fn pod_identity(pod: &Pod) -> (&str, &str) {
    (
        pod.metadata.namespace.as_deref().unwrap_or_default(),
        pod.metadata.name.as_deref().unwrap_or_default(),
    )
}
