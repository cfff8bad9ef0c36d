//! NRT Scheduler - NUMA topology-aware scheduling support
//!
//! Tracks resources reserved for pods until the node's topology report
//! catches up, and collects pod fingerprint status for debugging.

use anyhow::{Context, Result};
use nrt_scheduler::{api, config::SchedulerConfig, runtime::SchedulerRuntime};
use scheduler_lib::{
    health::HealthRegistry,
    observability::{SchedulerMetrics, StructuredLogger},
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SCHEDULER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting nrt-scheduler");

    let config = SchedulerConfig::load().context("Failed to load configuration")?;
    info!(
        scheduler_name = %config.scheduler_name,
        api_port = config.api_port,
        pfpstatus_http = config.pfpstatus.http.enabled,
        pfpstatus_storage = config.pfpstatus.storage.enabled,
        "Scheduler configured"
    );

    let health_registry = HealthRegistry::new();
    let metrics = SchedulerMetrics::new();

    let logger = StructuredLogger::new(&config.scheduler_name);
    logger.log_startup(SCHEDULER_VERSION);

    let runtime = SchedulerRuntime::start(&config, &health_registry, logger.clone()).await?;

    // Start health and metrics server
    let (api_shutdown, _) = broadcast::channel(1);
    let app_state = Arc::new(api::AppState::new(health_registry.clone(), metrics));
    let api_handle = tokio::spawn(api::serve(
        config.api_port,
        app_state,
        api_shutdown.subscribe(),
    ));

    health_registry.set_ready(true).await;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    logger.log_shutdown("SIGINT received");

    health_registry.set_ready(false).await;
    runtime.shutdown().await;

    let _ = api_shutdown.send(());
    match api_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "API server failed"),
        Err(e) => error!(error = %e, "API server task failed"),
    }

    info!("Shutdown complete");
    Ok(())
}
