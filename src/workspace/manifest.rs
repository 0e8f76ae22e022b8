// src/workspace/manifest.rs

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::dag::{GraphEdge, GraphNode, Runnable};
use crate::errors::Result;
use crate::exec::TaskFuture;

/// Package descriptor read from a package's manifest file.
///
/// ```yaml
/// package: core
/// deps: [common]
/// scripts:
///   - build.sh
///   - test.sh
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    #[serde(rename = "package")]
    pub name: String,

    /// Names of packages that must finish before this one starts.
    #[serde(default)]
    pub deps: Vec<String>,

    /// Scripts run in order with `sh`. After loading these are resolved
    /// against the package directory.
    #[serde(default)]
    pub scripts: Vec<PathBuf>,
}

/// Supported manifest encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Yaml,
    Toml,
}

impl ManifestFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Some(ManifestFormat::Yaml),
            Some("toml") => Some(ManifestFormat::Toml),
            _ => None,
        }
    }
}

impl Manifest {
    pub fn parse(contents: &str, format: ManifestFormat) -> Result<Self> {
        let manifest = match format {
            ManifestFormat::Yaml => serde_yaml::from_str(contents)?,
            ManifestFormat::Toml => toml::from_str(contents)?,
        };
        Ok(manifest)
    }

    /// Resolve script paths relative to `dir`.
    pub fn resolve_scripts(&mut self, dir: &Path) {
        for script in self.scripts.iter_mut() {
            *script = dir.join(&*script);
        }
    }

    /// One edge per declared dependency, directed `dep -> self`.
    pub fn dependency_edges(&self) -> impl Iterator<Item = DependencyEdge> + '_ {
        self.deps.iter().map(|dep| DependencyEdge {
            from: dep.clone(),
            to: self.name.clone(),
        })
    }

    /// Run every script in order, stopping at the first failure.
    pub async fn run_scripts(&self) -> anyhow::Result<PackageOutput> {
        info!(package = %self.name, scripts = self.scripts.len(), "running package");

        let mut outputs = Vec::with_capacity(self.scripts.len());

        for script in &self.scripts {
            debug!(package = %self.name, script = ?script, "running script");

            let output = Command::new("sh")
                .arg(script)
                .stdin(Stdio::null())
                .output()
                .await
                .with_context(|| {
                    format!("spawning sh for script {:?} of package '{}'", script, self.name)
                })?;

            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            for line in stdout.lines() {
                info!(package = %self.name, "{}", line);
            }

            if !output.status.success() {
                return Err(ScriptFailure {
                    package: self.name.clone(),
                    script: script.clone(),
                    exit_code: output.status.code(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                    completed: outputs,
                }
                .into());
            }

            outputs.push(ScriptOutput {
                script: script.clone(),
                stdout,
            });
        }

        Ok(PackageOutput {
            package: self.name.clone(),
            outputs,
        })
    }
}

impl GraphNode for Manifest {
    type Id = String;

    fn id(&self) -> String {
        self.name.clone()
    }
}

impl Runnable for Manifest {
    type Output = PackageOutput;

    fn run(self: Arc<Self>) -> TaskFuture<PackageOutput> {
        Box::pin(async move { self.run_scripts().await })
    }
}

/// `from` must complete before `to` starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
}

impl GraphEdge for DependencyEdge {
    type Id = String;

    fn from_id(&self) -> String {
        self.from.clone()
    }

    fn to_id(&self) -> String {
        self.to.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    pub script: PathBuf,
    pub stdout: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutput {
    pub package: String,
    pub outputs: Vec<ScriptOutput>,
}

/// A script exited unsuccessfully. Carries the outputs of the scripts that
/// ran before it.
#[derive(Debug, Error)]
#[error("script {script:?} of package '{package}' failed (exit code {exit_code:?}): {stderr}")]
pub struct ScriptFailure {
    pub package: String,
    pub script: PathBuf,
    pub exit_code: Option<i32>,
    pub stderr: String,
    pub completed: Vec<ScriptOutput>,
}
