// src/logging.rs

//! Tracing subscriber setup.
//!
//! The filter comes from `--log-level` when given, otherwise from the
//! `PAVER_LOG` environment variable (any `EnvFilter` directive string, e.g.
//! `paver=debug,info`), otherwise `info`. Output goes to stderr so package
//! stdout stays readable when piped.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "PAVER_LOG";

pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

/// CLI flag wins; an unparsable env value falls back to `info`.
fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(level.as_directive());
    }

    env.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_overrides_env() {
        let filter = build_filter(Some(LogLevel::Trace), Some("error"));
        assert_eq!(filter.to_string(), "trace");
    }

    #[test]
    fn env_directives_are_used() {
        let filter = build_filter(None, Some(" paver=debug "));
        assert_eq!(filter.to_string(), "paver=debug");
    }

    #[test]
    fn missing_env_defaults_to_info() {
        assert_eq!(build_filter(None, None).to_string(), "info");
        assert_eq!(build_filter(None, Some("")).to_string(), "info");
    }
}
