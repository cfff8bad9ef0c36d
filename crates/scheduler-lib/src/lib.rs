//! Scheduler library for NUMA topology-aware placement
//!
//! This crate provides the core functionality for:
//! - Exact resource quantity arithmetic
//! - Pending resource reservations and topology adjustment
//! - Pod fingerprint status collection, dumps and HTTP endpoints
//! - Health checks and observability

pub mod error;
pub mod health;
pub mod observability;
pub mod pfpstatus;
pub mod reservation;
pub mod resources;
pub mod topology;

#[cfg(test)]
mod test_utils;

pub use error::{AdjustError, AdjustReason, DumpError, QuantityError, RecorderError, ResourceError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use observability::{SchedulerMetrics, StructuredLogger};
pub use reservation::{ReservationCoordinator, TopologyEvent, TopologyStore};
pub use resources::{Quantity, ResourceCounter};
pub use topology::NodeResourceTopology;
