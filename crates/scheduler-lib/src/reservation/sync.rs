//! Topology informer event loop

use super::cache::{TopologyEvent, TopologyStore};
use super::coordinator::ReservationCoordinator;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

/// Drain topology events into the store and the coordinator
///
/// The store is updated before the pending set is flushed. In between, a
/// lookup sees the new report still adjusted for the old pending set,
/// which can only under-report availability.
pub async fn run_topology_sync(
    coordinator: Arc<ReservationCoordinator>,
    store: Arc<TopologyStore>,
    mut events: mpsc::Receiver<TopologyEvent>,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!("Starting topology sync loop");
    let mut handled = 0u64;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    info!(events = handled, "Topology event channel closed");
                    break;
                };

                debug!(node = %event.node_name(), kind = event.kind(), "Topology event");
                store.apply(&event);
                coordinator.handle_topology_event(&event);
                handled += 1;
            }
            _ = shutdown.recv() => {
                info!(events = handled, "Shutting down topology sync loop");
                break;
            }
        }
    }
}
