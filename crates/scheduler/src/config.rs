//! Scheduler configuration

use anyhow::{Context, Result};
use scheduler_lib::pfpstatus::PfpStatusParams;
use serde::Deserialize;

/// Scheduler configuration
///
/// Read from `NRT_*` environment variables; nested keys use `__`, e.g.
/// `NRT_PFPSTATUS__RECORDER__MAX_NODES=100`.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Scheduler profile name, attached to structured events
    #[serde(default = "default_scheduler_name")]
    pub scheduler_name: String,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Capacity of the topology event channel
    #[serde(default = "default_topology_event_buffer")]
    pub topology_event_buffer: usize,

    /// Apply the `PFP_STATUS_*` variables on top of `pfpstatus`
    #[serde(default = "default_pfpstatus_from_env")]
    pub pfpstatus_from_env: bool,

    #[serde(default)]
    pub pfpstatus: PfpStatusParams,
}

fn default_scheduler_name() -> String {
    "topology-aware-scheduler".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_topology_event_buffer() -> usize {
    256
}

fn default_pfpstatus_from_env() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scheduler_name: default_scheduler_name(),
            api_port: default_api_port(),
            topology_event_buffer: default_topology_event_buffer(),
            pfpstatus_from_env: default_pfpstatus_from_env(),
            pfpstatus: PfpStatusParams::default(),
        }
    }
}

impl SchedulerConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::from_sources(environment(), |key| std::env::var(key).ok())
    }

    /// Build from an `NRT` environment source, then apply `PFP_STATUS_*`
    /// overrides as returned by `lookup`
    pub fn from_sources<F>(env: config::Environment, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = config::Config::builder()
            .add_source(env)
            .build()
            .context("Failed to read NRT configuration")?;

        let mut cfg: SchedulerConfig = config
            .try_deserialize()
            .context("Invalid NRT configuration")?;

        if cfg.pfpstatus_from_env {
            cfg.pfpstatus.apply_env_from(lookup);
        }

        Ok(cfg)
    }
}

/// The `NRT_*` environment source
pub fn environment() -> config::Environment {
    config::Environment::with_prefix("NRT")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
