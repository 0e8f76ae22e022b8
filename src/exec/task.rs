// src/exec/task.rs

//! Task and result types exchanged with the worker pool.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Boxed, lazily-run unit of work. Nothing executes until it is polled.
pub type TaskFuture<O> = Pin<Box<dyn Future<Output = anyhow::Result<O>> + Send + 'static>>;

/// A unit of work identified by `id`.
pub struct Task<K, O> {
    pub id: K,
    pub thunk: TaskFuture<O>,
}

impl<K, O> Task<K, O> {
    pub fn new<F>(id: K, work: F) -> Self
    where
        F: Future<Output = anyhow::Result<O>> + Send + 'static,
    {
        Self {
            id,
            thunk: Box::pin(work),
        }
    }
}

impl<K: fmt::Debug, O> fmt::Debug for Task<K, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Exactly one of these is published per accepted task.
#[derive(Debug)]
pub struct TaskResult<K, O> {
    pub id: K,
    pub outcome: anyhow::Result<O>,
}

impl<K, O> TaskResult<K, O> {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}
