// src/logging.rs

//! Logging setup for `deptrace` using `tracing` + `tracing-subscriber`.
//!
//! The chosen level applies to `deptrace`'s own targets; everything else
//! (tokio and friends) stays at `warn`. Where the level comes from:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `DEPTRACE_LOG`: a bare level ("debug"), or a full filter directive
//!    list ("deptrace::tracker=trace,deptrace=info")
//! 3. default to `info`
//!
//! Logs are sent to STDERR so that stdout carries only `check --print-diff`
//! and `normalize` output.

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "DEPTRACE_LOG";

/// Initialise global logging subscriber.
///
/// Fails if a subscriber is already installed or `DEPTRACE_LOG` is not a
/// valid filter.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => crate_filter(level_from_log_level(lvl)),
        None => match std::env::var(LOG_ENV) {
            Ok(spec) => filter_from_spec(&spec)?,
            Err(_) => crate_filter(Level::INFO),
        },
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    Ok(())
}

/// Filter for a `DEPTRACE_LOG` value.
///
/// A bare level word is scoped to `deptrace`; anything else is handed to
/// [`EnvFilter`] as directives.
pub fn filter_from_spec(spec: &str) -> Result<EnvFilter> {
    if let Some(level) = parse_level_str(spec) {
        return Ok(crate_filter(level));
    }
    EnvFilter::try_new(spec.trim()).with_context(|| format!("invalid {LOG_ENV} value {spec:?}"))
}

/// `warn` globally, `level` for this crate.
pub fn crate_filter(level: Level) -> EnvFilter {
    EnvFilter::new(format!(
        "warn,{}={}",
        env!("CARGO_CRATE_NAME"),
        level.as_str().to_ascii_lowercase()
    ))
}

fn level_from_log_level(lvl: LogLevel) -> Level {
    match lvl {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
