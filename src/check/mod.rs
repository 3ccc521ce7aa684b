// src/check/mod.rs

//! Change detection against a previously written dependency report.
//!
//! The scan never stops at the first difference: every record is checked so
//! that `--print-diff` can show the full list. Only fatal problems (unreadable
//! report, malformed line, unset variable, failed hash) abort the scan, and
//! they turn the verdict into [`Verdict::Error`].

pub mod record;

pub use record::{parse_record, ReportRecord};

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::errors::{DeptraceError, Result};
use crate::fs::FileSystem;
use crate::report::{expand_path, hash_file, VarSource};
use crate::tracker::normalize;
use crate::types::Verdict;

/// Detailed outcome of a completed scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Number of records examined.
    pub records: usize,
    /// Files whose content no longer matches the recorded digest.
    pub changed: Vec<PathBuf>,
    /// Files that no longer exist.
    pub missing: Vec<PathBuf>,
    /// Files that exist but can no longer be read; counted as changed.
    pub unreadable: Vec<PathBuf>,
}

impl CheckReport {
    pub fn has_changes(&self) -> bool {
        !(self.changed.is_empty() && self.missing.is_empty() && self.unreadable.is_empty())
    }

    /// Missing and changed files are not distinguished in the verdict.
    pub fn verdict(&self) -> Verdict {
        if self.has_changes() {
            Verdict::ChangesFound
        } else {
            Verdict::NoChangesFound
        }
    }
}

/// Decide whether a rebuild is needed.
///
/// No report (or a report path that does not exist) means there is no
/// baseline, which always calls for a rebuild.
pub fn check(
    fs: &dyn FileSystem,
    report_path: Option<&Path>,
    vars: &dyn VarSource,
    print_diff: bool,
) -> Verdict {
    let Some(report_path) = report_path else {
        info!("no previous report given; rebuild required");
        return Verdict::ChangesFound;
    };

    if !fs.exists(report_path) {
        info!(report = ?report_path, "previous report not found; rebuild required");
        return Verdict::ChangesFound;
    }

    match check_report(fs, report_path, vars, print_diff) {
        Ok(report) => {
            let verdict = report.verdict();
            info!(
                report = ?report_path,
                records = report.records,
                changed = report.changed.len(),
                missing = report.missing.len(),
                %verdict,
                "change detection finished"
            );
            verdict
        }
        Err(err) => {
            error!(report = ?report_path, error = %err, "change detection failed");
            Verdict::Error
        }
    }
}

/// Scan every record of `report_path` against the current filesystem.
pub fn check_report(
    fs: &dyn FileSystem,
    report_path: &Path,
    vars: &dyn VarSource,
    print_diff: bool,
) -> Result<CheckReport> {
    let reader = fs
        .open_read(report_path)
        .map(BufReader::new)
        .map_err(DeptraceError::io("opening report", report_path))?;

    let mut report = CheckReport::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(DeptraceError::io("reading report", report_path))?;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if line.is_empty() {
            continue;
        }

        let record = parse_record(line).map_err(|reason| DeptraceError::ReportError {
            path: report_path.to_path_buf(),
            line: idx + 1,
            reason,
        })?;

        let path = resolve_record_path(record.path, vars)?;
        report.records += 1;

        if !fs.exists(&path) {
            info!(path = ?path, "recorded file no longer exists");
            if print_diff {
                println!(
                    "{} listed in {} was not found; consider rebuild",
                    path.display(),
                    report_path.display()
                );
            }
            report.missing.push(path);
            continue;
        }

        match hash_file(fs, &path)? {
            Some(current) if current == record.digest => {
                debug!(path = ?path, "unchanged");
            }
            Some(current) => {
                debug!(path = ?path, recorded = %record.digest, %current, "content changed");
                if print_diff {
                    println!("Changes found for {}", path.display());
                }
                report.changed.push(path);
            }
            None => {
                info!(path = ?path, "recorded file is no longer readable");
                if print_diff {
                    println!("Cannot read {}; treating as changed", path.display());
                }
                report.unreadable.push(path);
            }
        }
    }

    Ok(report)
}

/// Expand placeholders and re-normalize absolute results.
fn resolve_record_path(raw: &str, vars: &dyn VarSource) -> Result<PathBuf> {
    let expanded = expand_path(raw, vars)?;
    if expanded.starts_with('/') {
        Ok(PathBuf::from(normalize(&expanded).into_string()))
    } else {
        Ok(PathBuf::from(expanded))
    }
}
