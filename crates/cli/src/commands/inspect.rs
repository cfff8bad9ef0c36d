//! Offline rendering of status dump files

use anyhow::{Context, Result};
use std::path::Path;

use crate::client::NodeStatus;
use crate::commands::node::render_samples;
use crate::output::OutputFormat;

/// Read a dump file written by the scheduler
pub fn load_dump(path: &Path) -> Result<NodeStatus> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dump file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse dump file {}", path.display()))
}

/// Render a dump file; the node name comes from the samples or the file stem
pub fn inspect_file(path: &Path, format: OutputFormat) -> Result<()> {
    let samples = load_dump(path)?.into_samples();

    let node = samples
        .iter()
        .map(|s| s.node_name.as_str())
        .find(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_default();

    render_samples(&node, &samples, format)
}
