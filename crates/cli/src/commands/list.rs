//! Overview of every tracked node

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, NodeStatus, StatusSample};
use crate::output::{
    color_match, format_timestamp, print_info, print_json, print_table, print_warning, OutputFormat,
};
use std::collections::BTreeMap;

/// Row for the all-nodes table, built from a node's latest sample
#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Latest Seq")]
    seq: u64,
    #[tabled(rename = "Last Write")]
    last_write: String,
    #[tabled(rename = "Match")]
    matched: String,
    #[tabled(rename = "Samples")]
    samples: usize,
}

impl NodeRow {
    fn new(node: &str, samples: &[StatusSample]) -> Option<Self> {
        let latest = samples.iter().max_by_key(|s| s.seq_no)?;
        Some(Self {
            node: node.to_string(),
            seq: latest.seq_no,
            last_write: format_timestamp(&latest.last_write),
            matched: color_match(latest.is_match()),
            samples: samples.len(),
        })
    }
}

/// Show every node the server holds status for
pub async fn list_nodes(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let all = client.all_status().await?;
    render_nodes(all, format)
}

fn render_nodes(all: BTreeMap<String, NodeStatus>, format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        return print_json(&all);
    }

    if all.is_empty() {
        print_info("No node has reported fingerprint status yet.");
        return Ok(());
    }

    let mut rows = Vec::with_capacity(all.len());
    let mut mismatched = Vec::new();
    for (node, status) in all {
        let samples = status.into_samples();
        if let Some(row) = NodeRow::new(&node, &samples) {
            if samples.iter().max_by_key(|s| s.seq_no).is_some_and(|s| !s.is_match()) {
                mismatched.push(node);
            }
            rows.push(row);
        }
    }

    println!("{} ({} nodes)", "Fingerprint Status".bold(), rows.len().to_string().cyan());
    print_table(&rows);
    if !mismatched.is_empty() {
        print_warning(&format!(
            "Latest sample does not match on: {}",
            mismatched.join(", ")
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample(seq_no: u64, computed: &str) -> StatusSample {
        StatusSample {
            fingerprint_expected: "pfp0v001aa".to_string(),
            fingerprint_computed: computed.to_string(),
            pods: Vec::new(),
            node_name: "worker-0".to_string(),
            last_write: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, seq_no as u32).unwrap(),
            seq_no,
        }
    }

    #[test]
    fn test_row_uses_latest_sample() {
        let samples = vec![sample(5, "pfp0v001bb"), sample(2, "pfp0v001aa")];

        let row = NodeRow::new("worker-0", &samples).unwrap();

        assert_eq!(row.seq, 5);
        assert_eq!(row.last_write, "2024-03-01 12:00:05");
        assert_eq!(row.samples, 2);
        assert!(row.matched.contains("no"));
    }

    #[test]
    fn test_row_for_node_without_samples() {
        assert!(NodeRow::new("worker-0", &[]).is_none());
    }
}
