// src/workspace/mod.rs

//! Workspace discovery.
//!
//! Responsibilities:
//! - Define the per-package manifest model and its script runner (`manifest.rs`).
//! - Scan a workspace directory into packages and dependency edges (`loader.rs`).

pub mod loader;
pub mod manifest;

pub use loader::{load_package, load_workspace, Workspace, MANIFEST_FILE_NAMES};
pub use manifest::{
    DependencyEdge, Manifest, ManifestFormat, PackageOutput, ScriptFailure, ScriptOutput,
};
