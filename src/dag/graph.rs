// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::dag::node::{GraphEdge, GraphNode, Node};
use crate::errors::{PaverError, Result};

/// Structural part of the dependency graph: nodes, adjacency and roots.
///
/// Built once by [`DependencyGraph::load`] and read-only afterwards until
/// [`DependencyGraph::reset`]. Scheduling status lives in
/// [`NodeStatusTracker`](crate::dag::NodeStatusTracker).
#[derive(Debug)]
pub struct DependencyGraph<N: GraphNode> {
    nodes: HashMap<N::Id, Node<N>>,
    /// Outgoing edges per node, in the order they were loaded.
    adjacency: HashMap<N::Id, Vec<N::Id>>,
    /// Node ids in load order; keeps root and traversal order stable.
    order: Vec<N::Id>,
    roots: Vec<N::Id>,
    loaded: bool,
}

impl<N: GraphNode> Default for DependencyGraph<N> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            adjacency: HashMap::new(),
            order: Vec::new(),
            roots: Vec::new(),
            loaded: false,
        }
    }
}

impl<N: GraphNode> DependencyGraph<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from the full node and edge collections.
    ///
    /// Every edge `from -> to` is appended to `from`'s adjacency and records
    /// `from` as a predecessor of `to`. Roots are the ids that never appear as
    /// an edge target.
    ///
    /// Rejects duplicate node ids and edges naming unknown ids; on error the
    /// graph is left empty.
    pub fn load<E>(
        &mut self,
        nodes: impl IntoIterator<Item = N>,
        edges: impl IntoIterator<Item = E>,
    ) -> Result<()>
    where
        E: GraphEdge<Id = N::Id>,
    {
        if self.loaded {
            return Err(PaverError::AlreadyLoaded);
        }

        if let Err(err) = self.load_inner(nodes, edges) {
            self.reset();
            return Err(err);
        }

        self.loaded = true;
        debug!(
            nodes = self.nodes.len(),
            roots = self.roots.len(),
            "dependency graph loaded"
        );
        Ok(())
    }

    fn load_inner<E>(
        &mut self,
        nodes: impl IntoIterator<Item = N>,
        edges: impl IntoIterator<Item = E>,
    ) -> Result<()>
    where
        E: GraphEdge<Id = N::Id>,
    {
        for payload in nodes {
            let id = payload.id();
            if self.nodes.contains_key(&id) {
                return Err(PaverError::DuplicateNode(format!("{id:?}")));
            }
            self.order.push(id.clone());
            self.nodes.insert(id, Node::new(payload));
        }

        let mut targets: HashSet<N::Id> = HashSet::new();

        for edge in edges {
            let from = edge.from_id();
            let to = edge.to_id();

            if !self.nodes.contains_key(&from) {
                return Err(PaverError::UnknownNode(format!(
                    "{from:?} (edge {from:?} -> {to:?})"
                )));
            }

            let Some(target) = self.nodes.get_mut(&to) else {
                return Err(PaverError::UnknownNode(format!(
                    "{to:?} (edge {from:?} -> {to:?})"
                )));
            };

            target.predecessors.push(from.clone());
            self.adjacency.entry(from).or_default().push(to.clone());
            targets.insert(to);
        }

        self.roots = self
            .order
            .iter()
            .filter(|id| !targets.contains(*id))
            .cloned()
            .collect();

        Ok(())
    }

    /// Check the whole graph for a directed cycle.
    ///
    /// Mirrors the graph into a petgraph `DiGraph` and topologically sorts
    /// it; the sort fails on the first node found on a cycle.
    pub fn validate(&self) -> Result<()> {
        let mut graph: DiGraph<&N::Id, ()> = DiGraph::with_capacity(self.order.len(), 0);
        let index: HashMap<&N::Id, NodeIndex> = self
            .order
            .iter()
            .map(|id| (id, graph.add_node(id)))
            .collect();

        for (from, successors) in &self.adjacency {
            for to in successors {
                if let (Some(&a), Some(&b)) = (index.get(from), index.get(to)) {
                    graph.add_edge(a, b, ());
                }
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => {
                let node = graph[cycle.node_id()];
                Err(PaverError::DagCycle(format!(
                    "cycle detected in dependency graph involving node {node:?}"
                )))
            }
        }
    }

    /// Clear everything, returning to the pre-`load` state.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.adjacency.clear();
        self.order.clear();
        self.roots.clear();
        self.loaded = false;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn contains(&self, id: &N::Id) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &N::Id) -> Option<&Node<N>> {
        self.nodes.get(id)
    }

    /// Node ids in load order.
    pub fn ids(&self) -> &[N::Id] {
        &self.order
    }

    /// Ids with no incoming edges, in load order.
    pub fn roots(&self) -> &[N::Id] {
        &self.roots
    }

    /// Direct successors (targets of outgoing edges).
    pub fn successors_of(&self, id: &N::Id) -> &[N::Id] {
        self.adjacency
            .get(id)
            .map(|s| s.as_slice())
            .unwrap_or(&[])
    }

    /// Direct predecessors (sources of incoming edges).
    pub fn predecessors_of(&self, id: &N::Id) -> &[N::Id] {
        self.nodes
            .get(id)
            .map(|n| n.predecessors.as_slice())
            .unwrap_or(&[])
    }
}
