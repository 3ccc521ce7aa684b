// src/report/writer.rs

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::{DeptraceError, Result};
use crate::fs::FileSystem;
use crate::process::ProcessInfo;
use crate::report::digest::{hash_file, ContentDigest};
use crate::report::substitute::Substitutions;
use crate::tracker::Tracker;

/// What goes into the tracked report.
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    /// Prefix each record with the file's MD5 digest.
    pub checksum: bool,
    /// Append `<command line> (<pid>)` to each record.
    pub process_info: bool,
    /// Log tracked files that a later creation event marked as ignored.
    pub warn_tracked_ignored: bool,
    /// Leave such files out of the tracked report.
    pub exclude_tracked_ignored: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            checksum: true,
            process_info: false,
            warn_tracked_ignored: false,
            exclude_tracked_ignored: false,
        }
    }
}

/// Destinations; either may be omitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportTargets<'a> {
    pub tracked: Option<&'a Path>,
    pub ignored: Option<&'a Path>,
}

/// Counts of what was written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub tracked_records: usize,
    pub ignored_records: usize,
    /// Tracked files left out (unreadable, or filtered as late-ignored).
    pub skipped: usize,
    /// Tracked files that were gone by report time, recorded with
    /// [`ContentDigest::VANISHED`].
    pub vanished: usize,
}

/// Format one tracked-report line (without the newline).
pub fn format_tracked_record(
    digest: Option<&ContentDigest>,
    rendered_path: &str,
    info: Option<&ProcessInfo>,
) -> String {
    let mut line = String::with_capacity(rendered_path.len() + 48);
    if let Some(digest) = digest {
        line.push_str(&digest.to_hex());
        line.push('\t');
    }
    line.push_str(rendered_path);
    if let Some(info) = info {
        line.push('\t');
        line.push_str(&info.render());
    }
    line
}

/// Write the tracked and ignore reports.
///
/// The two dumps are independent: both are attempted, and a failure in one
/// does not undo the other. The first error is returned.
///
/// Each report is staged next to its destination and renamed into place
/// only once complete. A failed dump removes the destination as well, so
/// `check` never trusts a partial or stale report.
pub fn write_reports(
    tracker: &Tracker,
    options: &ReportOptions,
    substitutions: &Substitutions,
    targets: &ReportTargets<'_>,
) -> Result<ReportSummary> {
    let fs = tracker.filesystem();
    let mut summary = ReportSummary::default();
    let mut first_err = None;

    if let Some(path) = targets.tracked {
        match dump(fs, path, |out| write_tracked(out, tracker, options, substitutions)) {
            Ok(counts) => {
                summary = counts;
                info!(
                    file = ?path,
                    records = counts.tracked_records,
                    skipped = counts.skipped,
                    vanished = counts.vanished,
                    "wrote dependency report"
                );
            }
            Err(err) => first_err = Some(err),
        }
    }

    if let Some(path) = targets.ignored {
        match dump(fs, path, |out| write_ignored(out, tracker, substitutions)) {
            Ok(written) => {
                summary.ignored_records = written;
                info!(file = ?path, records = written, "wrote ignore report");
            }
            Err(err) => {
                first_err.get_or_insert(err);
            }
        }
    }

    match first_err {
        Some(err) => Err(err),
        None => Ok(summary),
    }
}

/// Write tracked records in key order.
///
/// Only the tracked-side counts of the returned summary are filled in.
pub fn write_tracked(
    out: &mut dyn Write,
    tracker: &Tracker,
    options: &ReportOptions,
    substitutions: &Substitutions,
) -> Result<ReportSummary> {
    let fs = tracker.filesystem();
    let filter = options.warn_tracked_ignored || options.exclude_tracked_ignored;
    let mut counts = ReportSummary::default();

    for (path, info) in tracker.tracked() {
        if filter && tracker.late_ignored().contains(path) {
            if options.warn_tracked_ignored {
                warn!(path = %path, "tracked file found in ignore list");
            }
            if options.exclude_tracked_ignored {
                counts.skipped += 1;
                continue;
            }
        }

        let digest = if options.checksum {
            match hash_file(fs, path.as_path()) {
                Ok(Some(digest)) => Some(digest),
                Ok(None) => {
                    warn!(path = %path, "no digest (permission denied); leaving out of report");
                    counts.skipped += 1;
                    continue;
                }
                Err(err) if err.is_not_found() => {
                    warn!(path = %path, "tracked file vanished before the report was written");
                    counts.vanished += 1;
                    Some(ContentDigest::VANISHED)
                }
                Err(err) => return Err(err),
            }
        } else {
            None
        };

        let info = if options.process_info { info.as_ref() } else { None };
        let line = format_tracked_record(
            digest.as_ref(),
            &substitutions.render_path(path.as_str()),
            info,
        );
        writeln!(out, "{line}").map_err(DeptraceError::io("writing record for", path.as_path()))?;
        counts.tracked_records += 1;
    }

    Ok(counts)
}

/// Write ignored paths in key order. Returns the number written.
pub fn write_ignored(
    out: &mut dyn Write,
    tracker: &Tracker,
    substitutions: &Substitutions,
) -> Result<usize> {
    for path in tracker.ignored() {
        writeln!(out, "{}", substitutions.render_path(path.as_str()))
            .map_err(DeptraceError::io("writing record for", path.as_path()))?;
    }
    Ok(tracker.ignored().len())
}

/// Stage `body`'s output beside `path`, then rename it into place.
///
/// On failure neither the staging file nor an older report at `path` is
/// left behind.
fn dump<T>(
    fs: &dyn FileSystem,
    path: &Path,
    body: impl FnOnce(&mut dyn Write) -> Result<T>,
) -> Result<T> {
    let staging = staging_path(path);
    let result = write_staged(fs, &staging, body).and_then(|value| {
        fs.rename(&staging, path)
            .map_err(DeptraceError::io("moving report into place at", path))?;
        Ok(value)
    });

    if result.is_err() {
        for leftover in [staging.as_path(), path] {
            match fs.remove_file(leftover) {
                Ok(()) => debug!(file = ?leftover, "removed incomplete report"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => warn!(file = ?leftover, error = %err, "could not remove report"),
            }
        }
    }
    result
}

/// The buffered writer is flushed and dropped before this returns.
fn write_staged<T>(
    fs: &dyn FileSystem,
    staging: &Path,
    body: impl FnOnce(&mut dyn Write) -> Result<T>,
) -> Result<T> {
    let file = fs
        .create_write(staging)
        .map_err(DeptraceError::io("creating report", staging))?;
    let mut writer = BufWriter::new(file);
    let value = body(&mut writer)?;
    writer
        .flush()
        .map_err(DeptraceError::io("flushing report", staging))?;
    Ok(value)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut staged = path.as_os_str().to_owned();
    staged.push(".partial");
    PathBuf::from(staged)
}
