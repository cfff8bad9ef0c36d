//! Node resource topology snapshots
//!
//! A snapshot is what the per-node topology updater last reported: the
//! NUMA zones of a node and, per zone, the capacity and availability of
//! each resource. Snapshots are shared read-only; adjustments are applied
//! to private copies.

mod adjust;

pub use adjust::{adjust_with_resource_counters, adjusted};

use crate::resources::Quantity;
use serde::{Deserialize, Serialize};

/// Topology report for one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResourceTopology {
    /// Node name; topology objects are keyed by it
    pub name: String,
    #[serde(default)]
    pub topology_policies: Vec<String>,
    #[serde(default)]
    pub zones: Vec<Zone>,
}

/// A NUMA zone (or any other sub-node placement domain)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub name: String,
    #[serde(rename = "type")]
    pub zone_type: String,
    #[serde(default)]
    pub resources: Vec<ResourceInfo>,
}

/// Capacity and availability of one resource within a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInfo {
    pub name: String,
    pub capacity: Quantity,
    pub allocatable: Quantity,
    pub available: Quantity,
}

impl Zone {
    pub fn find_resource_info(&self, name: &str) -> Option<&ResourceInfo> {
        self.resources.iter().find(|info| info.name == name)
    }
}

impl NodeResourceTopology {
    pub fn find_zone(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|zone| zone.name == name)
    }
}
