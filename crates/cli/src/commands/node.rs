//! Per-node fingerprint status

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::{ApiClient, StatusSample};
use crate::output::{
    color_match, format_fingerprint, format_timestamp, print_info, print_json, print_table,
    print_warning, OutputFormat,
};

/// Row for the per-node samples table
#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "Seq")]
    seq: u64,
    #[tabled(rename = "Last Write")]
    last_write: String,
    #[tabled(rename = "Expected")]
    expected: String,
    #[tabled(rename = "Computed")]
    computed: String,
    #[tabled(rename = "Match")]
    matched: String,
    #[tabled(rename = "Pods")]
    pods: usize,
}

impl From<&StatusSample> for SampleRow {
    fn from(sample: &StatusSample) -> Self {
        Self {
            seq: sample.seq_no,
            last_write: format_timestamp(&sample.last_write),
            expected: format_fingerprint(&sample.fingerprint_expected),
            computed: format_fingerprint(&sample.fingerprint_computed),
            matched: color_match(sample.is_match()),
            pods: sample.pods.len(),
        }
    }
}

/// Show the samples recorded for one node
pub async fn show_node(client: &ApiClient, node: &str, format: OutputFormat) -> Result<()> {
    let samples = client.node_status(node).await?.into_samples();
    render_samples(node, &samples, format)
}

/// Render samples oldest first, as a table or as JSON
pub fn render_samples(node: &str, samples: &[StatusSample], format: OutputFormat) -> Result<()> {
    let mut ordered: Vec<&StatusSample> = samples.iter().collect();
    ordered.sort_by_key(|s| s.seq_no);

    match format {
        OutputFormat::Json => print_json(&ordered)?,
        OutputFormat::Table => {
            println!("{} {}", "Fingerprint status for node".bold(), node.cyan());
            let rows: Vec<SampleRow> = ordered.iter().map(|s| SampleRow::from(*s)).collect();
            print_table(&rows);

            let mismatches = ordered.iter().filter(|s| !s.is_match()).count();
            if let Some(last) = ordered.last() {
                if !last.is_match() {
                    print_warning(&format!(
                        "Latest sample (seq {}) does not match; {} of {} samples mismatched",
                        last.seq_no,
                        mismatches,
                        ordered.len()
                    ));
                    if !last.pods.is_empty() {
                        let pods: Vec<String> = last
                            .pods
                            .iter()
                            .map(|p| format!("{}/{}", p.namespace, p.name))
                            .collect();
                        print_info(&format!("Pods in latest computation: {}", pods.join(", ")));
                    }
                }
            }
        }
    }

    Ok(())
}
