// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Default number of parallel workers.
pub const DEFAULT_WORKERS: usize = 2;

/// Command-line arguments for `paver`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "paver",
    version,
    about = "Run workspace packages in dependency order on a pool of parallel workers.",
    long_about = None
)]
pub struct CliArgs {
    /// Number of packages that may run at the same time (must be >= 1).
    #[arg(long, value_name = "N", default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Workspace directory: one subdirectory per package, each with a
    /// `manifest.yaml`.
    #[arg(long, value_name = "PATH", default_value = "./")]
    pub workdir: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PAVER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the workspace, print packages, but don't run any scripts.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["paver"]).unwrap();
        assert_eq!(args.workers, DEFAULT_WORKERS);
        assert_eq!(args.workdir, PathBuf::from("./"));
        assert!(!args.dry_run);
        assert!(args.log_level.is_none());
    }

    #[test]
    fn explicit_options() {
        let args = CliArgs::try_parse_from([
            "paver", "--workers", "8", "--workdir", "ws", "--log-level", "debug", "--dry-run",
        ])
        .unwrap();
        assert_eq!(args.workers, 8);
        assert_eq!(args.workdir, PathBuf::from("ws"));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(args.dry_run);
    }

    #[test]
    fn negative_workers_do_not_parse() {
        assert!(CliArgs::try_parse_from(["paver", "--workers", "-1"]).is_err());
    }
}
