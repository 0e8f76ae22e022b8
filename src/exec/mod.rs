// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`task`] defines the `Task` / `TaskResult` pair exchanged with the pool.
//! - [`pool`] owns the fixed set of workers that run submitted tasks and
//!   report one result per task.

pub mod pool;
pub mod task;

pub use pool::WorkerPool;
pub use task::{Task, TaskFuture, TaskResult};
