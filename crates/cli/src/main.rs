//! pfpctl - pod fingerprint status CLI
//!
//! Queries the scheduler's pfpstatus endpoint, or renders the dump
//! files it writes, to debug divergence between a node's topology
//! report and the pods the scheduler sees on it.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{inspect, list, node, status};
use std::path::PathBuf;

/// Pod fingerprint status CLI
#[derive(Parser)]
#[command(name = "pfpctl")]
#[command(author, version, about = "Inspect pod fingerprint status recorded by the scheduler", long_about = None)]
pub struct Cli {
    /// Status endpoint URL (can also be set via PFP_STATUS_URL env var)
    #[arg(long, env = "PFP_STATUS_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, global = true)]
    pub format: Option<output::OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show how many nodes have reported fingerprint status
    Status,

    /// List every node with its latest fingerprint sample
    List,

    /// Show the fingerprint samples recorded for a node
    Node {
        /// Node name
        name: String,
    },

    /// Render a status dump file without contacting the server
    Inspect {
        /// Path to a <node>.json dump file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run(Cli::parse()).await {
        output::print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;
    let format = config.resolve_format(cli.format);

    match cli.command {
        Commands::Status => {
            let client = client::ApiClient::new(&config.resolve_api_url(cli.api_url))?;
            status::show_node_count(&client, format).await?;
        }
        Commands::List => {
            let client = client::ApiClient::new(&config.resolve_api_url(cli.api_url))?;
            list::list_nodes(&client, format).await?;
        }
        Commands::Node { name } => {
            let client = client::ApiClient::new(&config.resolve_api_url(cli.api_url))?;
            node::show_node(&client, &name, format).await?;
        }
        Commands::Inspect { file } => {
            inspect::inspect_file(&file, format)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_node_with_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pfpctl",
            "node",
            "worker-0",
            "--format",
            "json",
            "--api-url",
            "http://scheduler:33445",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Node { ref name } if name == "worker-0"));
        assert!(matches!(cli.format, Some(output::OutputFormat::Json)));
        assert_eq!(cli.api_url.as_deref(), Some("http://scheduler:33445"));
    }

    #[test]
    fn test_parse_list() {
        let cli = Cli::try_parse_from(["pfpctl", "list", "-f", "json"]).unwrap();

        assert!(matches!(cli.command, Commands::List));
        assert!(matches!(cli.format, Some(output::OutputFormat::Json)));
    }

    #[test]
    fn test_node_requires_name() {
        assert!(Cli::try_parse_from(["pfpctl", "node"]).is_err());
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["pfpctl", "-f", "yaml", "status"]).is_err());
    }
}
