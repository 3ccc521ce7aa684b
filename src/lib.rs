// src/lib.rs

pub mod check;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod process;
pub mod report;
pub mod rules;
pub mod tracker;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{CheckArgs, CliArgs, Command, NormalizeArgs, RecordArgs};
use crate::config::{load_raw_or_default, ConfigFile, RawConfigFile};
use crate::engine::{spawn_feed_reader, Runtime, SessionEvent};
use crate::fs::{FileSystem, RealFileSystem};
use crate::process::{ProcessInspector, ProcfsInspector};
use crate::report::{write_reports, ProcessEnv, ReportTargets, Substitutions};
use crate::rules::{load_configured_rules, Rules};
use crate::tracker::{normalize, Tracker};

/// High-level entry point used by `main.rs`.
///
/// Returns the process exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = args.config.as_deref();
    match args.command {
        Command::Record(record_args) => {
            record(config_path, record_args).await?;
            Ok(0)
        }
        Command::Check(check_args) => check_command(config_path, check_args),
        Command::Normalize(normalize_args) => {
            print_normalized(&normalize_args);
            Ok(0)
        }
    }
}

/// `deptrace record`: consume the tracer feed, then write the reports.
///
/// This wires together:
/// - config loading and CLI overrides
/// - rule files
/// - tracker / runtime
/// - the tracer feed reader
/// - Ctrl-C handling
async fn record(config_path: Option<&Path>, args: RecordArgs) -> Result<()> {
    let mut raw = load_raw_or_default(config_path)?;
    apply_record_overrides(&mut raw, &args);
    let cfg = ConfigFile::try_from(raw)?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let rules = load_configured_rules(fs.as_ref(), &cfg.rules)?;

    if args.dry_run {
        print_dry_run(&cfg, &rules);
        return Ok(());
    }

    // Unset variables fail before any event is consumed.
    let substitutions =
        Substitutions::resolve(cfg.report.substitute_env.as_slice(), &ProcessEnv)?;

    let inspector: Arc<dyn ProcessInspector> = Arc::new(ProcfsInspector::default());
    let tracker = Tracker::new(fs, inspector.clone(), rules, cfg.tracker_options());

    let (tx, rx) = mpsc::channel::<SessionEvent>(256);

    let feed = if args.events == "-" {
        info!("reading tracer feed from stdin");
        spawn_feed_reader(tokio::io::stdin(), inspector.clone(), tx.clone())
    } else {
        let file = tokio::fs::File::open(&args.events)
            .await
            .with_context(|| format!("opening tracer feed {:?}", args.events))?;
        info!(feed = %args.events, "reading tracer feed");
        spawn_feed_reader(file, inspector.clone(), tx.clone())
    };

    // Ctrl-C → stop consuming events, still write reports.
    {
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(SessionEvent::ShutdownRequested).await;
        });
    }
    drop(tx);

    let (tracker, summary) = Runtime::new(tracker, rx).run().await;

    feed.abort();
    if let Ok(Err(err)) = feed.await {
        warn!(error = %err, "tracer feed ended with an error; reports may be incomplete");
    }

    let stats = tracker.stats();
    info!(
        events = summary.events,
        failed_events = summary.failed_events,
        interrupted = summary.interrupted,
        tracked = tracker.tracked().len(),
        ignored = tracker.ignored().len(),
        termination_requests = stats.termination_requests,
        abandoned_creations = stats.abandoned_creations,
        "recording finished"
    );

    let targets = ReportTargets {
        tracked: cfg.report.tracked.as_deref(),
        ignored: cfg.report.ignored.as_deref(),
    };
    if targets.tracked.is_none() && targets.ignored.is_none() {
        warn!("no report destination configured; nothing written");
    }
    write_reports(&tracker, &cfg.report_options(), &substitutions, &targets)?;

    Ok(())
}

/// `deptrace check`: exit code is the verdict's.
fn check_command(config_path: Option<&Path>, args: CheckArgs) -> Result<i32> {
    let cfg = ConfigFile::try_from(load_raw_or_default(config_path)?)?;
    let report = args.report.or(cfg.report.tracked);

    let verdict = check::check(&RealFileSystem, report.as_deref(), &ProcessEnv, args.print_diff);
    debug!(%verdict, "check verdict");
    Ok(verdict.exit_code())
}

fn print_normalized(args: &NormalizeArgs) {
    for path in &args.paths {
        println!("{}", normalize(path));
    }
}

/// CLI flags win over the config file.
fn apply_record_overrides(raw: &mut RawConfigFile, args: &RecordArgs) {
    if let Some(path) = &args.report {
        raw.report.tracked = Some(path.clone());
    }
    if let Some(path) = &args.ignore_report {
        raw.report.ignored = Some(path.clone());
    }
    if let Some(path) = &args.exclude_rules {
        raw.rules.exclude = Some(path.clone());
    }
    if let Some(path) = &args.kill_rules {
        raw.rules.kill = Some(path.clone());
    }
    if let Some(syntax) = args.rule_syntax {
        raw.rules.syntax = syntax;
    }
    if args.no_checksum {
        raw.report.checksum = false;
    }
    if args.process_info {
        raw.report.process_info = true;
    }
    for name in &args.substitute {
        if !raw.report.substitute_env.contains(name) {
            raw.report.substitute_env.push(name.clone());
        }
    }
}

/// Simple dry-run output: print the effective settings and rules.
fn print_dry_run(cfg: &ConfigFile, rules: &Rules) {
    println!("deptrace dry-run");
    println!("  rules.syntax = {:?}", cfg.rules.syntax);
    println!("  rules.strict_rule_limit = {}", cfg.rules.strict_rule_limit);
    println!("  report.tracked = {:?}", cfg.report.tracked);
    println!("  report.ignored = {:?}", cfg.report.ignored);
    println!("  report.checksum = {}", cfg.report.checksum);
    println!("  report.process_info = {}", cfg.report.process_info);
    if !cfg.report.substitute_env.is_empty() {
        println!("  report.substitute_env = {:?}", cfg.report.substitute_env);
    }
    println!();

    for set in [&rules.exclude, &rules.kill] {
        println!("{} rules ({}):", set.label(), set.len());
        for idx in 0..set.len() {
            if let Some(pattern) = set.pattern(idx) {
                println!("  - {pattern}");
            }
        }
    }

    debug!("dry-run complete (no events read)");
}
