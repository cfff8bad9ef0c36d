//! Background task wiring

use crate::config::SchedulerConfig;
use anyhow::{Context, Result};
use scheduler_lib::{
    health::{components, HealthRegistry},
    observability::StructuredLogger,
    pfpstatus::{self, StatusSender},
    reservation::{run_topology_sync, ReservationCoordinator, TopologyEvent, TopologyStore},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How long shutdown waits for each background task
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Running scheduler state shared with the framework integration
pub struct SchedulerRuntime {
    /// Reservation-aware topology view for Filter/Score and Reserve/Unreserve
    pub coordinator: Arc<ReservationCoordinator>,
    pub topology_store: Arc<TopologyStore>,
    /// Feed for topology informer events
    pub topology_events: mpsc::Sender<TopologyEvent>,
    /// Feed for pod fingerprint statuses, if the status pipeline runs
    pub status: Option<StatusSender>,
    shutdown: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerRuntime {
    /// Build the coordinator and start every background loop
    pub async fn start(
        config: &SchedulerConfig,
        health: &HealthRegistry,
        logger: StructuredLogger,
    ) -> Result<Self> {
        let (shutdown, _) = broadcast::channel(1);
        let mut tasks = Vec::new();

        let topology_store = Arc::new(TopologyStore::new());
        let coordinator = Arc::new(ReservationCoordinator::new(
            topology_store.clone(),
            logger,
        ));

        health.register(components::RESERVATION).await;
        let (topology_events, events_rx) = mpsc::channel(config.topology_event_buffer.max(1));
        tasks.push(tokio::spawn(run_topology_sync(
            coordinator.clone(),
            topology_store.clone(),
            events_rx,
            shutdown.subscribe(),
        )));

        let status = pfpstatus::setup(&config.pfpstatus, health, &shutdown)
            .await
            .context("Failed to set up pfpstatus")?
            .map(|handle| {
                tasks.extend(handle.tasks);
                handle.sender
            });

        info!(
            tasks = tasks.len(),
            pfpstatus = status.is_some(),
            "Scheduler runtime started"
        );

        Ok(Self {
            coordinator,
            topology_store,
            topology_events,
            status,
            shutdown,
            tasks,
        })
    }

    /// Signal every loop to stop and wait for them
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        drop(self.topology_events);

        for task in self.tasks {
            match tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Background task failed"),
                Err(_) => warn!("Background task did not stop in time"),
            }
        }
        info!("Scheduler runtime stopped");
    }
}
