#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use paver::dag::{GraphNode, NodeStatusTracker, Runnable};
use paver::exec::TaskFuture;

use crate::recorder::ExecutionLog;

/// Node payload whose work is scripted by the test: optional delay, optional
/// failure, and start/finish events recorded in a shared [`ExecutionLog`].
#[derive(Debug, Clone)]
pub struct TestNode {
    pub id: String,
    pub delay: Duration,
    pub fail: bool,
    log: ExecutionLog,
}

impl GraphNode for TestNode {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }
}

impl Runnable for TestNode {
    type Output = String;

    fn run(self: Arc<Self>) -> TaskFuture<String> {
        Box::pin(async move {
            self.log.record_start(&self.id);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.log.record_finish(&self.id);

            if self.fail {
                anyhow::bail!("{} failed on purpose", self.id);
            }
            Ok(self.id.clone())
        })
    }
}

/// Builder for a loaded `NodeStatusTracker<TestNode>`.
pub struct GraphBuilder {
    nodes: Vec<TestNode>,
    edges: Vec<(String, String)>,
    log: ExecutionLog,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            log: ExecutionLog::new(),
        }
    }

    fn push(mut self, id: &str, delay: Duration, fail: bool) -> Self {
        self.nodes.push(TestNode {
            id: id.to_string(),
            delay,
            fail,
            log: self.log.clone(),
        });
        self
    }

    pub fn node(self, id: &str) -> Self {
        self.push(id, Duration::ZERO, false)
    }

    pub fn slow_node(self, id: &str, millis: u64) -> Self {
        self.push(id, Duration::from_millis(millis), false)
    }

    pub fn failing_node(self, id: &str) -> Self {
        self.push(id, Duration::ZERO, true)
    }

    pub fn slow_failing_node(self, id: &str, millis: u64) -> Self {
        self.push(id, Duration::from_millis(millis), true)
    }

    /// `from` must finish before `to` starts.
    pub fn edge(mut self, from: &str, to: &str) -> Self {
        self.edges.push((from.to_string(), to.to_string()));
        self
    }

    /// Handle to the log shared by every node built so far and after.
    pub fn log(&self) -> ExecutionLog {
        self.log.clone()
    }

    pub fn edges(&self) -> &[(String, String)] {
        &self.edges
    }

    pub fn build(self) -> NodeStatusTracker<TestNode> {
        let mut tracker = NodeStatusTracker::new();
        tracker
            .load(self.nodes, self.edges)
            .expect("Failed to load test graph");
        tracker
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
