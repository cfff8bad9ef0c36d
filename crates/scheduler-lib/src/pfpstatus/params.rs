//! Status pipeline parameters

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Enables storage and names its base directory
pub const PFP_STATUS_DUMP_ENV: &str = "PFP_STATUS_DUMP";
/// Host the HTTP endpoint binds to
pub const PFP_STATUS_HOST_ENV: &str = "PFP_STATUS_HOST";
/// Enables the HTTP endpoint on the given port
pub const PFP_STATUS_PORT_ENV: &str = "PFP_STATUS_PORT";

pub const DEFAULT_HTTP_PORT: u16 = 33445;
pub const DEFAULT_DUMP_DIRECTORY: &str = "/run/pfpstatus";
pub const DEFAULT_DUMP_PERIOD_SECS: u64 = 10;
pub const DEFAULT_MAX_NODES: usize = 5000;
pub const DEFAULT_MAX_SAMPLES_PER_NODE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpParams {
    pub enabled: bool,
    /// Empty means all interfaces
    pub host: String,
    pub port: u16,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            enabled: true,
            host: String::new(),
            port: DEFAULT_HTTP_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageParams {
    pub enabled: bool,
    pub directory: PathBuf,
    pub period_secs: u64,
}

impl Default for StorageParams {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: PathBuf::from(DEFAULT_DUMP_DIRECTORY),
            period_secs: DEFAULT_DUMP_PERIOD_SECS,
        }
    }
}

impl StorageParams {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs.max(1))
    }
}

/// Which store backs the pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderMode {
    /// Latest sample per node only
    Latest,
    /// Bounded window of recent samples per node
    #[default]
    Windowed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderParams {
    pub mode: RecorderMode,
    pub max_nodes: usize,
    pub max_samples_per_node: usize,
}

impl Default for RecorderParams {
    fn default() -> Self {
        Self {
            mode: RecorderMode::default(),
            max_nodes: DEFAULT_MAX_NODES,
            max_samples_per_node: DEFAULT_MAX_SAMPLES_PER_NODE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PfpStatusParams {
    pub http: HttpParams,
    pub storage: StorageParams,
    pub recorder: RecorderParams,
}

impl PfpStatusParams {
    pub fn is_enabled(&self) -> bool {
        self.http.enabled || self.storage.enabled
    }

    /// Apply the `PFP_STATUS_*` variables from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply the `PFP_STATUS_*` variables as returned by `lookup`
    ///
    /// An unset or empty dump variable disables storage, and so does a
    /// directory that does not exist. An unset, empty or unparseable port
    /// disables HTTP. The host only applies while HTTP is enabled.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(PFP_STATUS_DUMP_ENV).filter(|dir| !dir.is_empty()) {
            Some(dir) => {
                self.storage.enabled = true;
                self.storage.directory = PathBuf::from(dir);
            }
            None => self.storage.enabled = false,
        }

        if self.storage.enabled && !is_directory(&self.storage.directory) {
            info!(
                directory = %self.storage.directory.display(),
                "Dump directory not found, storage disabled"
            );
            self.storage.enabled = false;
        }

        match lookup(PFP_STATUS_PORT_ENV).filter(|port| !port.is_empty()) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(port) => {
                    self.http.enabled = true;
                    self.http.port = port;
                }
                Err(e) => {
                    warn!(port = %raw, error = %e, "Invalid status port, HTTP disabled");
                    self.http.enabled = false;
                }
            },
            None => self.http.enabled = false,
        }

        if let Some(host) = lookup(PFP_STATUS_HOST_ENV) {
            if self.http.enabled {
                self.http.host = host;
            }
        }
    }
}

fn is_directory(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_dir())
        .unwrap_or(false)
}
