// src/lib.rs

pub mod cli;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod workspace;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::dag::NodeStatusTracker;
use crate::engine::{RunReport, Scheduler};
use crate::errors::{PaverError, Result};
use crate::fs::RealFileSystem;
use crate::workspace::{load_workspace, Manifest, Workspace};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - argument validation
/// - workspace loading (manifests -> nodes + edges)
/// - graph load + cycle validation
/// - the scheduler run
pub async fn run(args: CliArgs) -> Result<Option<RunReport<String>>> {
    if args.workers == 0 {
        return Err(PaverError::ConfigError(
            "--workers must be >= 1 (got 0)".to_string(),
        ));
    }

    let workspace = load_workspace(&RealFileSystem, &args.workdir)?;

    if args.dry_run {
        let tracker = prepare(workspace.clone())?;
        print_dry_run(&workspace, &tracker);
        return Ok(None);
    }

    let tracker = prepare(workspace)?;
    let scheduler = Scheduler::new(tracker, args.workers);
    let report = scheduler.run().await?;

    info!(
        completed = report.completed.len(),
        total = report.total,
        "all packages completed"
    );
    Ok(Some(report))
}

/// Load the workspace into a tracker and reject cycles before anything runs.
fn prepare(workspace: Workspace) -> Result<NodeStatusTracker<Manifest>> {
    let tracker = workspace.into_tracker()?;
    tracker.validate()?;
    Ok(tracker)
}

/// Dry-run output: packages, their deps, scripts and the initial roots.
fn print_dry_run(workspace: &Workspace, tracker: &NodeStatusTracker<Manifest>) {
    println!("paver dry-run");
    println!("  workspace = {}", workspace.root.display());
    println!();

    println!("packages ({}):", workspace.packages.len());
    for package in &workspace.packages {
        println!("  - {}", package.name);
        if !package.deps.is_empty() {
            println!("      deps: {:?}", package.deps);
        }
        for script in &package.scripts {
            println!("      script: {}", script.display());
        }
    }
    println!();
    println!("roots: {:?}", tracker.graph().roots());

    debug!("dry-run complete (no execution)");
}
