//! Status ingestion
//!
//! Producers hand statuses to a `StatusSender`, which never blocks: when
//! the channel is full the status is dropped and counted. The matching
//! `StatusReceiver` is moved into exactly one collect loop, which pushes
//! everything it receives into a store.

use super::status::FingerprintStatus;
use super::store::StatusStore;
use crate::observability::SchedulerMetrics;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

/// Default channel capacity
pub const DEFAULT_STATUS_CHANNEL_CAPACITY: usize = 1024;

/// Producer side of the status channel
#[derive(Clone)]
pub struct StatusSender {
    tx: mpsc::Sender<FingerprintStatus>,
    metrics: SchedulerMetrics,
}

impl StatusSender {
    /// Offer a status to the collector without waiting
    ///
    /// Returns false if the status was dropped.
    pub fn send(&self, status: FingerprintStatus) -> bool {
        match self.tx.try_send(status) {
            Ok(()) => true,
            Err(TrySendError::Full(status)) => {
                debug!(node = %status.node_name, "Status channel full, dropping status");
                self.metrics.inc_status_samples_dropped();
                false
            }
            Err(TrySendError::Closed(status)) => {
                debug!(node = %status.node_name, "Status collector gone, dropping status");
                self.metrics.inc_status_samples_dropped();
                false
            }
        }
    }
}

/// Consumer side of the status channel
pub struct StatusReceiver {
    rx: mpsc::Receiver<FingerprintStatus>,
}

impl StatusReceiver {
    pub async fn recv(&mut self) -> Option<FingerprintStatus> {
        self.rx.recv().await
    }
}

/// Create a bounded status channel
pub fn status_channel(capacity: usize) -> (StatusSender, StatusReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        StatusSender {
            tx,
            metrics: SchedulerMetrics::new(),
        },
        StatusReceiver { rx },
    )
}

/// Drain the status channel into `store`
///
/// Push failures drop the status; the loop keeps going. Stops on
/// shutdown or once every sender is gone.
pub async fn run_collect_loop<S: StatusStore>(
    store: Arc<S>,
    mut receiver: StatusReceiver,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!("Starting status collect loop");
    let metrics = SchedulerMetrics::new();

    loop {
        tokio::select! {
            status = receiver.recv() => {
                let Some(status) = status else {
                    info!("Status channel closed, stopping collect loop");
                    break;
                };

                let node = status.node_name.clone();
                match store.push(status) {
                    Ok(()) => {
                        metrics.inc_status_samples_recorded();
                        metrics.set_status_nodes_tracked(store.count_nodes());
                    }
                    Err(e) => {
                        debug!(node = %node, error = %e, "Dropping status");
                        metrics.inc_status_samples_dropped();
                    }
                }
            }
            _ = shutdown.recv() => {
                info!("Shutting down status collect loop");
                break;
            }
        }
    }
}
