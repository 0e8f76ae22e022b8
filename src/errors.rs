// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaverError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid manifest {path:?}: {message}")]
    ManifestError { path: PathBuf, message: String },

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Edge references unknown node: {0}")]
    UnknownNode(String),

    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("Graph is already loaded; reset it before loading again")]
    AlreadyLoaded,

    #[error("Cycle detected in dependency graph: {0}")]
    DagCycle(String),

    #[error("Worker pool is closed")]
    PoolClosed,

    #[error("Task {task} failed: {reason}")]
    TaskFailed { task: String, reason: String },

    #[error("Tracker already in use ({running} running, {done} done); reset and reload it first")]
    TrackerInUse { running: usize, done: usize },
}

pub type Result<T> = std::result::Result<T, PaverError>;
