//! Latest-wins status store

use super::status::{system_clock, Clock, FingerprintStatus, StatusSample};
use super::store::StatusStore;
use crate::error::RecorderError;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

#[derive(Default)]
struct LatestState {
    seq_no: u64,
    samples: HashMap<String, StatusSample>,
}

/// Keeps only the most recent sample of each node
pub struct LatestStatusStore {
    max_nodes: usize,
    clock: Clock,
    state: RwLock<LatestState>,
}

impl LatestStatusStore {
    pub fn new(max_nodes: usize) -> Result<Self, RecorderError> {
        Self::with_clock(max_nodes, system_clock())
    }

    /// Store holding at most `max_nodes` nodes, which must be positive
    pub fn with_clock(max_nodes: usize, clock: Clock) -> Result<Self, RecorderError> {
        if max_nodes == 0 {
            return Err(RecorderError::InvalidLimits {
                max_nodes,
                max_samples_per_node: 1,
            });
        }
        Ok(Self {
            max_nodes,
            clock,
            state: RwLock::new(LatestState::default()),
        })
    }
}

impl StatusStore for LatestStatusStore {
    type NodeContent = StatusSample;

    /// Replace the node's sample; a new node beyond the limit is refused
    fn push(&self, status: FingerprintStatus) -> Result<(), RecorderError> {
        if status.node_name.is_empty() {
            return Err(RecorderError::EmptyNodeName);
        }
        let last_write = (self.clock)();

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.samples.contains_key(&status.node_name) && state.samples.len() >= self.max_nodes {
            return Err(RecorderError::CapacityExceeded {
                max_nodes: self.max_nodes,
            });
        }

        state.seq_no += 1;
        let sample = StatusSample {
            seq_no: state.seq_no,
            last_write,
            status,
        };
        state.samples.insert(sample.status.node_name.clone(), sample);
        Ok(())
    }

    fn content(&self) -> HashMap<String, StatusSample> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .samples
            .clone()
    }

    fn content_for_node(&self, node: &str) -> Option<StatusSample> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .samples
            .get(node)
            .cloned()
    }

    fn count_nodes(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .samples
            .len()
    }
}
