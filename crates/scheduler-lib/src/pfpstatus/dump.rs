//! Periodic per-node status dumps

use super::store::StatusStore;
use crate::error::DumpError;
use crate::health::{components, HealthRegistry};
use crate::observability::SchedulerMetrics;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::{interval_at, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Write one node's content to `<dir>/<node>.json`
///
/// The file is replaced atomically, readers never see a partial dump.
/// On failure the temporary file is removed.
pub fn dump_to_file<T: Serialize>(dir: &Path, node: &str, content: &T) -> Result<PathBuf, DumpError> {
    if !is_plain_file_name(node) {
        return Err(DumpError::InvalidNodeName(node.to_string()));
    }

    let data = serde_json::to_vec(content)?;
    let path = dir.join(format!("{}.json", node));
    let temp_path = dir.join(format!(".{}.json.tmp", node));

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(io_error(&temp_path))?;

    let result = file
        .write_all(&data)
        .and_then(|_| file.sync_all())
        .map_err(io_error(&temp_path))
        .and_then(|_| std::fs::rename(&temp_path, &path).map_err(io_error(&path)));
    drop(file);

    if let Err(e) = result {
        if let Err(rm) = std::fs::remove_file(&temp_path) {
            debug!(path = %temp_path.display(), error = %rm, "Failed to remove temporary dump file");
        }
        return Err(e);
    }

    Ok(path)
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DumpError {
    let path = path.to_path_buf();
    move |source| DumpError::Io { path, source }
}

fn is_plain_file_name(node: &str) -> bool {
    let mut components = Path::new(node).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name == node
    )
}

/// Dump every node of a snapshot; returns how many files failed
///
/// A failure on one node does not stop the others.
pub fn dump_snapshot<T: Serialize>(dir: &Path, snapshot: &HashMap<String, T>) -> usize {
    let mut failures = 0;
    for (node, content) in snapshot {
        if let Err(e) = dump_to_file(dir, node, content) {
            warn!(node = %node, dir = %dir.display(), error = %e, "Failed to dump node status");
            failures += 1;
        }
    }
    failures
}

/// Periodically dump the store's content under `dir`
pub async fn run_dump_loop<S: StatusStore>(
    store: Arc<S>,
    dir: PathBuf,
    period: Duration,
    health: HealthRegistry,
    mut shutdown: broadcast::Receiver<()>,
) {
    info!(dir = %dir.display(), period_secs = period.as_secs(), "Starting status dump loop");
    let metrics = SchedulerMetrics::new();

    let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let snapshot = store.content();
                if snapshot.is_empty() {
                    continue;
                }

                let start = Instant::now();
                let nodes = snapshot.len();
                let target = dir.clone();
                let failures = match tokio::task::spawn_blocking(move || dump_snapshot(&target, &snapshot)).await {
                    Ok(failures) => failures,
                    Err(e) => {
                        warn!(error = %e, "Status dump task failed");
                        nodes
                    }
                };

                if failures > 0 {
                    metrics.add_status_dump_failures(failures);
                    health
                        .set_degraded(
                            components::STATUS_DUMP,
                            format!("{} of {} node dumps failed", failures, nodes),
                        )
                        .await;
                } else {
                    health.set_healthy(components::STATUS_DUMP).await;
                }
                metrics.observe_status_dump_latency(start.elapsed().as_secs_f64());
                debug!(nodes = nodes, failures = failures, "Status dump cycle complete");
            }
            _ = shutdown.recv() => {
                info!("Shutting down status dump loop");
                break;
            }
        }
    }
}
