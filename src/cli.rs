// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::RuleSyntax;

/// Command-line arguments for `deptrace`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "deptrace",
    version,
    about = "Record the files a build reads and decide when it must run again.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Deptrace.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEPTRACE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Consume a tracer feed and write dependency reports.
    Record(RecordArgs),
    /// Compare a previous dependency report against the filesystem.
    Check(CheckArgs),
    /// Print the lexically normalized form of each path.
    Normalize(NormalizeArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RecordArgs {
    /// Tracer feed to read (`-` for stdin).
    #[arg(long, value_name = "PATH", default_value = "-")]
    pub events: String,

    /// Tracked report destination (overrides `[report].tracked`).
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Ignore report destination (overrides `[report].ignored`).
    #[arg(long, value_name = "PATH")]
    pub ignore_report: Option<PathBuf>,

    /// Exclude rule file (overrides `[rules].exclude`).
    #[arg(long, value_name = "PATH")]
    pub exclude_rules: Option<PathBuf>,

    /// Kill rule file (overrides `[rules].kill`).
    #[arg(long, value_name = "PATH")]
    pub kill_rules: Option<PathBuf>,

    /// Rule file syntax (overrides `[rules].syntax`).
    #[arg(long, value_name = "SYNTAX")]
    pub rule_syntax: Option<RuleSyntax>,

    /// Do not write digests into the tracked report.
    #[arg(long)]
    pub no_checksum: bool,

    /// Record the command line of the process that opened each file.
    #[arg(long)]
    pub process_info: bool,

    /// Replace this variable's value with `$NAME` in reports (repeatable).
    #[arg(long = "substitute", value_name = "NAME")]
    pub substitute: Vec<String>,

    /// Parse + validate config and rules, print them, but read no events.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Previous tracked report (defaults to `[report].tracked`).
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Print every changed or missing file.
    #[arg(long)]
    pub print_diff: bool,
}

#[derive(Debug, Clone, Args)]
pub struct NormalizeArgs {
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<String>,
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

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
