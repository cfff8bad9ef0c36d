//! Pod fingerprint status records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Namespace and name of a pod
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespacedName {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
}

impl NamespacedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Outcome of one pod fingerprint computation on a node
///
/// The expected fingerprint is the one the node's topology report
/// carries; the computed one is derived from the pods the scheduler
/// sees on that node. A mismatch means the two views have diverged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintStatus {
    #[serde(default)]
    pub fingerprint_expected: String,
    #[serde(default)]
    pub fingerprint_computed: String,
    #[serde(default)]
    pub pods: Vec<NamespacedName>,
    #[serde(default)]
    pub node_name: String,
}

impl FingerprintStatus {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            ..Default::default()
        }
    }

    pub fn with_fingerprints(
        mut self,
        expected: impl Into<String>,
        computed: impl Into<String>,
    ) -> Self {
        self.fingerprint_expected = expected.into();
        self.fingerprint_computed = computed.into();
        self
    }

    pub fn with_pods(mut self, pods: Vec<NamespacedName>) -> Self {
        self.pods = pods;
        self
    }

    pub fn is_match(&self) -> bool {
        self.fingerprint_expected == self.fingerprint_computed
    }
}

/// A status as stored: the record plus collection metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSample {
    #[serde(flatten)]
    pub status: FingerprintStatus,
    pub last_write: DateTime<Utc>,
    /// Per-store sequence number, starting at 1
    pub seq_no: u64,
}

/// Wall clock source for stamping samples
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}
