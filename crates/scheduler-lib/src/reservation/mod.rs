//! Pending resource reservations
//!
//! Pods the scheduler placed but whose resources the node has not yet
//! reported as used are tracked per node, and subtracted from the node's
//! topology until the next report arrives.

mod cache;
mod coordinator;
mod sync;
mod tracker;


pub use cache::{PassthroughCache, TopologyCache, TopologyEvent, TopologyLister, TopologyStore};
pub use coordinator::ReservationCoordinator;
pub use sync::run_topology_sync;
pub use tracker::PendingResourceTracker;
