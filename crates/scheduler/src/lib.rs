//! Host process for the topology-aware scheduler
//!
//! Configuration, the health/metrics API and the wiring of the
//! reservation and pfpstatus background loops.

pub mod api;
pub mod config;
pub mod runtime;
