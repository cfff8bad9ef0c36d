//! Windowed status recorder
//!
//! Keeps the last few samples of every node, for a bounded number of
//! nodes. When a new node arrives at the node limit, the node that was
//! updated least recently is dropped entirely.

use super::status::{system_clock, Clock, FingerprintStatus, StatusSample};
use super::store::StatusStore;
use crate::error::RecorderError;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

#[derive(Debug, Default)]
struct NodeWindow {
    samples: VecDeque<StatusSample>,
    /// Sequence number of the newest sample, key into the recency index
    last_seq: u64,
}

#[derive(Debug, Default)]
struct RecorderState {
    seq_no: u64,
    nodes: HashMap<String, NodeWindow>,
    /// last_seq -> node name, oldest update first
    recency: BTreeMap<u64, String>,
}

impl RecorderState {
    fn evict_least_recent(&mut self) -> Option<String> {
        let (_, node) = self.recency.pop_first()?;
        self.nodes.remove(&node);
        Some(node)
    }
}

/// Bounded per-node sample windows
pub struct StatusRecorder {
    max_nodes: usize,
    max_samples_per_node: usize,
    clock: Clock,
    state: RwLock<RecorderState>,
}

impl StatusRecorder {
    pub fn new(max_nodes: usize, max_samples_per_node: usize) -> Result<Self, RecorderError> {
        Self::with_clock(max_nodes, max_samples_per_node, system_clock())
    }

    pub fn with_clock(
        max_nodes: usize,
        max_samples_per_node: usize,
        clock: Clock,
    ) -> Result<Self, RecorderError> {
        if max_nodes == 0 || max_samples_per_node == 0 {
            return Err(RecorderError::InvalidLimits {
                max_nodes,
                max_samples_per_node,
            });
        }

        Ok(Self {
            max_nodes,
            max_samples_per_node,
            clock,
            state: RwLock::new(RecorderState::default()),
        })
    }

    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    pub fn max_samples_per_node(&self) -> usize {
        self.max_samples_per_node
    }
}

impl StatusStore for StatusRecorder {
    type NodeContent = Vec<StatusSample>;

    fn push(&self, status: FingerprintStatus) -> Result<(), RecorderError> {
        if status.node_name.is_empty() {
            return Err(RecorderError::EmptyNodeName);
        }
        let last_write = (self.clock)();

        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let state = &mut *guard;
        state.seq_no += 1;
        let seq_no = state.seq_no;
        let node = status.node_name.clone();

        if let Some(window) = state.nodes.get(&node) {
            state.recency.remove(&window.last_seq);
        } else if state.nodes.len() >= self.max_nodes {
            if let Some(evicted) = state.evict_least_recent() {
                debug!(node = %evicted, incoming = %node, "Evicted least recently updated node");
            }
        }

        let window = state.nodes.entry(node.clone()).or_default();
        window.samples.push_back(StatusSample {
            status,
            last_write,
            seq_no,
        });
        while window.samples.len() > self.max_samples_per_node {
            window.samples.pop_front();
        }
        window.last_seq = seq_no;
        state.recency.insert(seq_no, node);

        Ok(())
    }

    fn content(&self) -> HashMap<String, Vec<StatusSample>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .nodes
            .iter()
            .map(|(node, window)| (node.clone(), window.samples.iter().cloned().collect()))
            .collect()
    }

    /// Samples for the node, oldest first
    fn content_for_node(&self, node: &str) -> Option<Vec<StatusSample>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .nodes
            .get(node)
            .map(|window| window.samples.iter().cloned().collect())
    }

    fn count_nodes(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .nodes
            .len()
    }
}
