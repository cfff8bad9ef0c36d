//! Pod fingerprint status pipeline
//!
//! Per-node agents report whether the pod fingerprint they computed
//! matches the one the node's topology advertises. The reports are
//! collected into a bounded store, which is periodically dumped to files
//! and served over HTTP for debugging.

mod collector;
mod dump;
mod latest;
mod params;
mod record;
mod server;
mod status;
mod store;


pub use collector::{
    run_collect_loop, status_channel, StatusReceiver, StatusSender,
    DEFAULT_STATUS_CHANNEL_CAPACITY,
};
pub use dump::{dump_snapshot, dump_to_file, run_dump_loop};
pub use latest::LatestStatusStore;
pub use params::{
    HttpParams, PfpStatusParams, RecorderMode, RecorderParams, StorageParams,
    DEFAULT_DUMP_DIRECTORY, DEFAULT_HTTP_PORT, DEFAULT_MAX_NODES, DEFAULT_MAX_SAMPLES_PER_NODE,
    PFP_STATUS_DUMP_ENV, PFP_STATUS_HOST_ENV, PFP_STATUS_PORT_ENV,
};
pub use record::StatusRecorder;
pub use server::{bind_address, create_router, serve};
pub use status::{system_clock, Clock, FingerprintStatus, NamespacedName, StatusSample};
pub use store::StatusStore;

use crate::error::RecorderError;
use crate::health::{components, HealthRegistry};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Running status pipeline
pub struct PfpStatusHandle {
    /// Hand statuses to the pipeline; clone freely
    pub sender: StatusSender,
    pub tasks: Vec<JoinHandle<()>>,
}

/// Start the status pipeline for the enabled backends
///
/// Returns `None` when neither HTTP nor storage is enabled. Every task
/// stops when `shutdown` fires.
pub async fn setup(
    params: &PfpStatusParams,
    health: &HealthRegistry,
    shutdown: &broadcast::Sender<()>,
) -> Result<Option<PfpStatusHandle>, RecorderError> {
    if !params.is_enabled() {
        info!("No pfpstatus backend enabled, nothing to do");
        return Ok(None);
    }

    info!(
        http = params.http.enabled,
        storage = params.storage.enabled,
        mode = ?params.recorder.mode,
        max_nodes = params.recorder.max_nodes,
        max_samples_per_node = params.recorder.max_samples_per_node,
        "Setting up pfpstatus"
    );

    let handle = match params.recorder.mode {
        RecorderMode::Latest => {
            let store = Arc::new(LatestStatusStore::new(params.recorder.max_nodes)?);
            spawn_pipeline(store, params, health, shutdown).await
        }
        RecorderMode::Windowed => {
            let store = Arc::new(StatusRecorder::new(
                params.recorder.max_nodes,
                params.recorder.max_samples_per_node,
            )?);
            spawn_pipeline(store, params, health, shutdown).await
        }
    };

    Ok(Some(handle))
}

async fn spawn_pipeline<S: StatusStore>(
    store: Arc<S>,
    params: &PfpStatusParams,
    health: &HealthRegistry,
    shutdown: &broadcast::Sender<()>,
) -> PfpStatusHandle {
    let (sender, receiver) = status_channel(DEFAULT_STATUS_CHANNEL_CAPACITY);
    let mut tasks = Vec::new();

    health.register(components::STATUS_COLLECTOR).await;
    tasks.push(tokio::spawn(run_collect_loop(
        store.clone(),
        receiver,
        shutdown.subscribe(),
    )));

    if params.storage.enabled {
        health.register(components::STATUS_DUMP).await;
        tasks.push(tokio::spawn(run_dump_loop(
            store.clone(),
            params.storage.directory.clone(),
            params.storage.period(),
            health.clone(),
            shutdown.subscribe(),
        )));
    }

    if params.http.enabled {
        health.register(components::STATUS_SERVER).await;
        let http = params.http.clone();
        let health = health.clone();
        let shutdown = shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = serve(store, &http, shutdown).await {
                error!(error = %e, "Cannot serve PFP status");
                health
                    .set_unhealthy(components::STATUS_SERVER, format!("{:#}", e))
                    .await;
            }
        }));
    }

    PfpStatusHandle { sender, tasks }
}
