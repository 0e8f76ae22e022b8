// src/engine/mod.rs

//! Run orchestration.
//!
//! [`Scheduler`] combines the status tracker and the worker pool into one
//! run: dispatch pending nodes, release finished ones, drain on completion or
//! on the first failure.

pub mod scheduler;

pub use scheduler::{RunReport, Scheduler};

/// Run-level phase, reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Pending nodes are being dispatched.
    Running,
    /// No further dispatch; waiting for accepted tasks to publish results.
    Draining,
    Done,
}
