//! Observability infrastructure for the scheduler
//!
//! Provides:
//! - Prometheus metrics (reservation bookkeeping, topology adjustment, status pipeline)
//! - Structured JSON logging with tracing

use crate::resources::ResourceCounter;
use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter, IntGauge,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Histogram buckets for dump cycle durations (in seconds)
const DUMP_LATENCY_BUCKETS: &[f64] = &[0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<SchedulerMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct SchedulerMetricsInner {
    reservations: IntCounter,
    unreservations: IntCounter,
    reservation_errors: IntCounter,
    topology_adjustments: IntCounter,
    topology_adjust_errors: IntCounter,
    topology_flushes: IntCounter,
    nodes_discarded: IntCounter,
    pending_nodes: IntGauge,
    status_samples_recorded: IntCounter,
    status_samples_dropped: IntCounter,
    status_nodes_tracked: IntGauge,
    status_dump_failures: IntCounter,
    status_dump_latency_seconds: Histogram,
}

impl SchedulerMetricsInner {
    fn new() -> Self {
        Self {
            reservations: register_int_counter!(
                "nrt_scheduler_reservations_total",
                "Pods whose resources were added to a node's pending set"
            )
            .expect("Failed to register reservations"),

            unreservations: register_int_counter!(
                "nrt_scheduler_unreservations_total",
                "Pods whose resources were removed from a node's pending set"
            )
            .expect("Failed to register unreservations"),

            reservation_errors: register_int_counter!(
                "nrt_scheduler_reservation_errors_total",
                "Per-resource inconsistencies found while releasing pending resources"
            )
            .expect("Failed to register reservation_errors"),

            topology_adjustments: register_int_counter!(
                "nrt_scheduler_topology_adjustments_total",
                "Topology lookups adjusted for pending resources"
            )
            .expect("Failed to register topology_adjustments"),

            topology_adjust_errors: register_int_counter!(
                "nrt_scheduler_topology_adjust_errors_total",
                "Zone resources clamped to zero while adjusting for pending resources"
            )
            .expect("Failed to register topology_adjust_errors"),

            topology_flushes: register_int_counter!(
                "nrt_scheduler_topology_flushes_total",
                "Pending sets discarded because fresher topology data arrived"
            )
            .expect("Failed to register topology_flushes"),

            nodes_discarded: register_int_counter!(
                "nrt_scheduler_nodes_discarded_total",
                "Nodes ruled out by the topology filter"
            )
            .expect("Failed to register nodes_discarded"),

            pending_nodes: register_int_gauge!(
                "nrt_scheduler_pending_nodes",
                "Nodes currently holding a pending resource set"
            )
            .expect("Failed to register pending_nodes"),

            status_samples_recorded: register_int_counter!(
                "nrt_scheduler_pfp_samples_recorded_total",
                "Pod fingerprint status samples stored by the recorder"
            )
            .expect("Failed to register status_samples_recorded"),

            status_samples_dropped: register_int_counter!(
                "nrt_scheduler_pfp_samples_dropped_total",
                "Pod fingerprint status samples dropped before or at the recorder"
            )
            .expect("Failed to register status_samples_dropped"),

            status_nodes_tracked: register_int_gauge!(
                "nrt_scheduler_pfp_nodes_tracked",
                "Nodes with recorded pod fingerprint status"
            )
            .expect("Failed to register status_nodes_tracked"),

            status_dump_failures: register_int_counter!(
                "nrt_scheduler_pfp_dump_failures_total",
                "Per-node status dump files that could not be written"
            )
            .expect("Failed to register status_dump_failures"),

            status_dump_latency_seconds: register_histogram!(
                "nrt_scheduler_pfp_dump_latency_seconds",
                "Time spent writing one status dump cycle",
                DUMP_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register status_dump_latency_seconds"),
        }
    }
}

/// Scheduler metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct SchedulerMetrics {
    _private: (),
}

impl Default for SchedulerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(SchedulerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &SchedulerMetricsInner {
        GLOBAL_METRICS.get_or_init(SchedulerMetricsInner::new)
    }

    pub fn inc_reservations(&self) {
        self.inner().reservations.inc();
    }

    pub fn inc_unreservations(&self) {
        self.inner().unreservations.inc();
    }

    pub fn add_reservation_errors(&self, count: usize) {
        self.inner().reservation_errors.inc_by(count as u64);
    }

    pub fn inc_topology_adjustments(&self) {
        self.inner().topology_adjustments.inc();
    }

    pub fn add_topology_adjust_errors(&self, count: usize) {
        self.inner().topology_adjust_errors.inc_by(count as u64);
    }

    pub fn inc_topology_flushes(&self) {
        self.inner().topology_flushes.inc();
    }

    pub fn inc_nodes_discarded(&self) {
        self.inner().nodes_discarded.inc();
    }

    pub fn set_pending_nodes(&self, count: usize) {
        self.inner().pending_nodes.set(count as i64);
    }

    pub fn inc_status_samples_recorded(&self) {
        self.inner().status_samples_recorded.inc();
    }

    pub fn inc_status_samples_dropped(&self) {
        self.inner().status_samples_dropped.inc();
    }

    pub fn set_status_nodes_tracked(&self, count: usize) {
        self.inner().status_nodes_tracked.set(count as i64);
    }

    pub fn add_status_dump_failures(&self, count: usize) {
        self.inner().status_dump_failures.inc_by(count as u64);
    }

    pub fn observe_status_dump_latency(&self, duration_secs: f64) {
        self.inner().status_dump_latency_seconds.observe(duration_secs);
    }
}

/// Structured logger for scheduler events
///
/// Provides consistent JSON-formatted logging for reservations,
/// reconciliation and lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    scheduler_name: String,
}

impl StructuredLogger {
    pub fn new(scheduler_name: impl Into<String>) -> Self {
        Self {
            scheduler_name: scheduler_name.into(),
        }
    }

    pub fn scheduler_name(&self) -> &str {
        &self.scheduler_name
    }

    /// Log a pod reserved on a node
    pub fn log_reserve(&self, namespace: &str, pod_name: &str, node: &str, pending: &ResourceCounter) {
        debug!(
            event = "pod_reserved",
            scheduler = %self.scheduler_name,
            namespace = %namespace,
            pod_name = %pod_name,
            node = %node,
            resources = %pending,
            "Added pod resources to pending set"
        );
    }

    /// Log a pod reservation undone
    pub fn log_unreserve(&self, namespace: &str, pod_name: &str, node: &str, errors: usize) {
        if errors > 0 {
            warn!(
                event = "pod_unreserved",
                scheduler = %self.scheduler_name,
                namespace = %namespace,
                pod_name = %pod_name,
                node = %node,
                errors = errors,
                "Pending set disagreed with pod accounting while releasing resources"
            );
        } else {
            debug!(
                event = "pod_unreserved",
                scheduler = %self.scheduler_name,
                namespace = %namespace,
                pod_name = %pod_name,
                node = %node,
                "Removed pod resources from pending set"
            );
        }
    }

    /// Log a pending set superseded by fresh topology data
    pub fn log_flush(&self, node: &str, reason: &str) {
        debug!(
            event = "topology_flushed",
            scheduler = %self.scheduler_name,
            node = %node,
            reason = %reason,
            "Discarded pending resources for node"
        );
    }

    /// Log scheduler startup
    pub fn log_startup(&self, version: &str) {
        info!(
            event = "scheduler_started",
            scheduler = %self.scheduler_name,
            version = %version,
            "Topology-aware scheduler started"
        );
    }

    /// Log scheduler shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "scheduler_shutdown",
            scheduler = %self.scheduler_name,
            reason = %reason,
            "Topology-aware scheduler shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_metrics_creation() {
        // Metrics live in the global Prometheus registry; creating
        // several handles must reuse the same instance.
        let metrics = SchedulerMetrics::new();
        let again = SchedulerMetrics::new();

        metrics.inc_reservations();
        metrics.add_reservation_errors(2);
        metrics.set_pending_nodes(3);
        again.inc_status_samples_recorded();
        again.observe_status_dump_latency(0.002);

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "nrt_scheduler_reservations_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("topo-aware-scheduler");
        assert_eq!(logger.scheduler_name(), "topo-aware-scheduler");
    }
}
