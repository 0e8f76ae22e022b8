// src/dag/node.rs

//! Capability traits for graph payloads and per-node status.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::exec::TaskFuture;

/// A payload that can be stored as a node in a [`DependencyGraph`].
///
/// [`DependencyGraph`]: crate::dag::DependencyGraph
pub trait GraphNode: Send + Sync + 'static {
    /// Unique identifier of a node (e.g. a package name).
    type Id: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    fn id(&self) -> Self::Id;
}

/// An ordered pair of ids: `from` must complete before `to` starts.
pub trait GraphEdge {
    type Id;

    fn from_id(&self) -> Self::Id;
    fn to_id(&self) -> Self::Id;
}

/// A node payload that knows how to perform its own work.
///
/// The returned future is the task thunk: nothing runs until the worker pool
/// polls it.
pub trait Runnable: GraphNode {
    type Output: Send + 'static;

    fn run(self: Arc<Self>) -> TaskFuture<Self::Output>;
}

/// Plain `(from, to)` tuples are usable as edges.
impl<K: Clone> GraphEdge for (K, K) {
    type Id = K;

    fn from_id(&self) -> K {
        self.0.clone()
    }

    fn to_id(&self) -> K {
        self.1.clone()
    }
}

/// Loaded node: the payload plus the ids of its direct predecessors.
#[derive(Debug)]
pub struct Node<N: GraphNode> {
    pub(crate) payload: Arc<N>,
    pub(crate) predecessors: Vec<N::Id>,
}

impl<N: GraphNode> Node<N> {
    pub(crate) fn new(payload: N) -> Self {
        Self {
            payload: Arc::new(payload),
            predecessors: Vec::new(),
        }
    }

    pub fn payload(&self) -> &Arc<N> {
        &self.payload
    }

    /// Ids of nodes that must finish before this one may start.
    pub fn predecessors(&self) -> &[N::Id] {
        &self.predecessors
    }
}

/// Scheduling status of a node within a run.
///
/// A node only ever advances `Pending -> Running -> {Await | Success}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// All predecessors are done; waiting to be dispatched.
    Pending,
    /// Handed out by the tracker and not yet released.
    Running,
    /// Released while some successor was still blocked on other predecessors.
    Await,
    /// Released after every successor had already been unblocked.
    Success,
}

impl NodeStatus {
    /// `Await` and `Success` are both terminal for every downstream purpose.
    pub fn is_done(self) -> bool {
        matches!(self, NodeStatus::Await | NodeStatus::Success)
    }
}
