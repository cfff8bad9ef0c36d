//! Server-wide status summary

use anyhow::Result;
use colored::Colorize;

use crate::client::ApiClient;
use crate::output::{print_info, print_json, OutputFormat};

/// Show how many nodes the server holds fingerprint status for
pub async fn show_node_count(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let count = client.node_count().await?;

    match format {
        OutputFormat::Json => print_json(&count)?,
        OutputFormat::Table => {
            println!("{}", "Fingerprint Status".bold());
            println!("{}", "=".repeat(50));
            println!("Tracked nodes:          {}", count.nodes.to_string().cyan());
            if count.nodes == 0 {
                println!();
                print_info("No node has reported fingerprint status yet.");
            }
        }
    }

    Ok(())
}
