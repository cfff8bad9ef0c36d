//! Error types shared across the scheduler library
//!
//! Bookkeeping errors (`ResourceError`, `AdjustError`) are diagnostics:
//! callers log them and carry on. The remaining types surface to the
//! immediate caller as regular failures.

use crate::resources::Quantity;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to parse a resource quantity string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("invalid quantity {0:?}")]
    Invalid(String),

    #[error("quantity {0:?} is out of range")]
    OutOfRange(String),
}

/// Per-resource failure reported by `ResourceCounter::sub_with_checks`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("cannot subtract {resource:?}={requested}: not in base set")]
    MissingBaseResource { resource: String, requested: Quantity },

    #[error("cannot subtract {resource:?}={requested}: not enough in base set ({available})")]
    SubtractionUnderflow {
        resource: String,
        requested: Quantity,
        available: Quantity,
    },

    #[error("cannot subtract {resource:?}={requested}: negative quantity")]
    NegativeRequest { resource: String, requested: Quantity },
}

impl ResourceError {
    /// Name of the resource the error refers to
    pub fn resource(&self) -> &str {
        match self {
            ResourceError::MissingBaseResource { resource, .. }
            | ResourceError::SubtractionUnderflow { resource, .. }
            | ResourceError::NegativeRequest { resource, .. } => resource,
        }
    }
}

/// Why a zone resource could not be adjusted as asked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustReason {
    /// Less available than pending; clamped to zero
    Insufficient,
    /// Negative pending quantity; skipped
    NegativeRequest,
    /// Reported availability above capacity; clamped to capacity first
    AvailableAboveCapacity,
}

impl fmt::Display for AdjustReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            AdjustReason::Insufficient => "not enough available",
            AdjustReason::NegativeRequest => "negative pending quantity",
            AdjustReason::AvailableAboveCapacity => "available above capacity",
        };
        f.write_str(reason)
    }
}

/// A zone resource that could not be decremented by the full pending amount
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot decrement resource {resource:?} on {node:?} (zone {zone:?}) by {requested}: {reason} (available {available})")]
pub struct AdjustError {
    pub node: String,
    pub zone: String,
    pub resource: String,
    pub reason: AdjustReason,
    pub available: Quantity,
    pub requested: Quantity,
}

/// Status recorder failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecorderError {
    #[error("status has an empty node name")]
    EmptyNodeName,

    #[error("too many nodes tracked (max {max_nodes})")]
    CapacityExceeded { max_nodes: usize },

    #[error("invalid recorder limits: max_nodes={max_nodes} max_samples_per_node={max_samples_per_node}")]
    InvalidLimits {
        max_nodes: usize,
        max_samples_per_node: usize,
    },
}

/// Failure to write one node's status dump
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("node name {0:?} is not usable as a file name")]
    InvalidNodeName(String),

    #[error("failed to serialize status content: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
