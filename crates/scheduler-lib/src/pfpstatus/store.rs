use super::status::FingerprintStatus;
use crate::error::RecorderError;
use serde::Serialize;
use std::collections::HashMap;

/// Concurrent per-node status aggregator
///
/// `push` is called from the single collect loop; the read operations
/// are called concurrently from HTTP handlers and the dump loop and
/// return copies that can be serialized without holding any lock.
pub trait StatusStore: Send + Sync + 'static {
    /// What is kept, and served, for a single node
    type NodeContent: Serialize + Clone + Send + Sync + 'static;

    fn push(&self, status: FingerprintStatus) -> Result<(), RecorderError>;

    fn content(&self) -> HashMap<String, Self::NodeContent>;

    fn content_for_node(&self, node: &str) -> Option<Self::NodeContent>;

    fn count_nodes(&self) -> usize;
}
