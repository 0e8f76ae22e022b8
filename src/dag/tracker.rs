// src/dag/tracker.rs

//! Node status tracking and the release protocol.
//!
//! Every node id lives in exactly one of four sets: pending, running, await,
//! success. All transitions happen under a single mutex, so a predecessor's
//! release is always fully visible before any dependent's eligibility is
//! evaluated.
//!
//! Callers must release each dispatched node exactly once. The scheduler
//! upholds this with a single dispatcher and a single result consumer; the
//! tracker itself does not guard against double release.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tracing::{debug, trace, warn};

use crate::dag::graph::DependencyGraph;
use crate::dag::node::{GraphEdge, GraphNode, NodeStatus};
use crate::errors::Result;

#[derive(Debug)]
struct StatusSets<K> {
    pending: HashSet<K>,
    running: HashSet<K>,
    awaiting: HashSet<K>,
    success: HashSet<K>,
}

impl<K> Default for StatusSets<K> {
    fn default() -> Self {
        Self {
            pending: HashSet::new(),
            running: HashSet::new(),
            awaiting: HashSet::new(),
            success: HashSet::new(),
        }
    }
}

impl<K: std::hash::Hash + Eq> StatusSets<K> {
    fn is_done(&self, id: &K) -> bool {
        self.awaiting.contains(id) || self.success.contains(id)
    }

    fn is_active(&self, id: &K) -> bool {
        self.pending.contains(id) || self.running.contains(id)
    }

    fn started(&self) -> usize {
        self.running.len() + self.awaiting.len() + self.success.len()
    }

    fn clear(&mut self) {
        self.pending.clear();
        self.running.clear();
        self.awaiting.clear();
        self.success.clear();
    }
}

/// Snapshot of the status set sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub pending: usize,
    pub running: usize,
    pub awaiting: usize,
    pub success: usize,
}

impl StatusCounts {
    pub fn done(&self) -> usize {
        self.awaiting + self.success
    }
}

/// A node handed out for execution.
#[derive(Debug)]
pub struct PendingNode<N> {
    pub node: Arc<N>,
    /// `true` when every node has now left `pending` for good; no further
    /// pending node will appear in this run.
    pub is_last: bool,
}

/// Owns the dependency graph and the per-node status sets.
#[derive(Debug)]
pub struct NodeStatusTracker<N: GraphNode> {
    graph: DependencyGraph<N>,
    status: Mutex<StatusSets<N::Id>>,
    /// Raised whenever a release leaves `pending` non-empty.
    ready: Notify,
}

impl<N: GraphNode> Default for NodeStatusTracker<N> {
    fn default() -> Self {
        Self {
            graph: DependencyGraph::new(),
            status: Mutex::new(StatusSets::default()),
            ready: Notify::new(),
        }
    }
}

impl<N: GraphNode> NodeStatusTracker<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the graph and seed `pending` with its roots.
    pub fn load<E>(
        &mut self,
        nodes: impl IntoIterator<Item = N>,
        edges: impl IntoIterator<Item = E>,
    ) -> Result<()>
    where
        E: GraphEdge<Id = N::Id>,
    {
        self.graph.load(nodes, edges)?;

        let status = self.status.get_mut().unwrap_or_else(PoisonError::into_inner);
        status.clear();
        status.pending.extend(self.graph.roots().iter().cloned());

        debug!(
            total = self.graph.len(),
            roots = ?self.graph.roots(),
            "status tracker seeded with roots"
        );
        Ok(())
    }

    /// Reject cycles before scheduling. Performs no mutation.
    pub fn validate(&self) -> Result<()> {
        self.graph.validate()
    }

    /// Clear the graph and every status set.
    pub fn reset(&mut self) {
        self.graph.reset();
        self.status
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn graph(&self) -> &DependencyGraph<N> {
        &self.graph
    }

    pub fn total_nodes(&self) -> usize {
        self.graph.len()
    }

    /// Move one pending node to `running`.
    ///
    /// Non-blocking: returns `None` if nothing is pending right now.
    /// Selection order among pending nodes is unspecified.
    pub fn get_pending_node(&self) -> Option<PendingNode<N>> {
        let mut status = self.lock();

        let id = status.pending.iter().next()?.clone();
        status.pending.remove(&id);
        status.running.insert(id.clone());

        let is_last = status.started() == self.graph.len();
        let node = self.graph.node(&id)?.payload().clone();

        trace!(node = ?id, is_last, "pending -> running");
        Some(PendingNode { node, is_last })
    }

    /// Wait until a node is pending, then take it as [`get_pending_node`] does.
    ///
    /// Only one task should wait here at a time; the wake-up signal is a
    /// single stored permit.
    ///
    /// [`get_pending_node`]: NodeStatusTracker::get_pending_node
    pub async fn next_pending(&self) -> PendingNode<N> {
        loop {
            if let Some(pending) = self.get_pending_node() {
                return pending;
            }
            self.ready.notified().await;
        }
    }

    /// Release a finished node and unblock its successors.
    ///
    /// A successor becomes pending once every one of its other predecessors is
    /// done. The released node ends in `success` if all of its successors are
    /// now pending or running, otherwise in `await`.
    pub fn release_node(&self, id: &N::Id) -> NodeStatus {
        let mut status = self.lock();

        if !status.running.remove(id) {
            warn!(node = ?id, "released a node that was not running");
        }

        let mut all_successors_active = true;

        for succ in self.graph.successors_of(id) {
            let unblocked = self
                .graph
                .predecessors_of(succ)
                .iter()
                .filter(|p| *p != id)
                .all(|p| status.is_done(p));

            if unblocked && !status.is_active(succ) {
                debug!(node = ?succ, released_by = ?id, "successor unblocked");
                status.pending.insert(succ.clone());
            }

            if !status.is_active(succ) {
                all_successors_active = false;
            }
        }

        let outcome = if all_successors_active {
            status.success.insert(id.clone());
            NodeStatus::Success
        } else {
            status.awaiting.insert(id.clone());
            NodeStatus::Await
        };

        let has_pending = !status.pending.is_empty();
        drop(status);

        if has_pending {
            self.ready.notify_one();
        }

        trace!(node = ?id, ?outcome, "running -> done");
        outcome
    }

    pub fn status_of(&self, id: &N::Id) -> Option<NodeStatus> {
        let status = self.lock();

        if status.pending.contains(id) {
            Some(NodeStatus::Pending)
        } else if status.running.contains(id) {
            Some(NodeStatus::Running)
        } else if status.awaiting.contains(id) {
            Some(NodeStatus::Await)
        } else if status.success.contains(id) {
            Some(NodeStatus::Success)
        } else {
            None
        }
    }

    pub fn counts(&self) -> StatusCounts {
        let status = self.lock();
        StatusCounts {
            pending: status.pending.len(),
            running: status.running.len(),
            awaiting: status.awaiting.len(),
            success: status.success.len(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StatusSets<N::Id>> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
