// src/dag/mod.rs

//! Dependency graph and scheduling state.
//!
//! - [`node`] defines the payload capability traits and [`NodeStatus`].
//! - [`graph`] holds the structural graph: nodes, adjacency, roots, and the
//!   cycle check.
//! - [`tracker`] partitions node ids into status sets and implements the
//!   release protocol that decides when a node becomes pending.

pub mod graph;
pub mod node;
pub mod tracker;

pub use graph::DependencyGraph;
pub use node::{GraphEdge, GraphNode, Node, NodeStatus, Runnable};
pub use tracker::{NodeStatusTracker, PendingNode, StatusCounts};
