// src/tracker/mod.rs

//! Dependency tracker.
//!
//! Owns all per-run state:
//! - the tracked map (genuine build inputs, with optional process info),
//! - the ignore map (excluded or transiently created files),
//! - the pending-creation slot,
//! - the exclude and kill rule sets.
//!
//! A path lives in at most one of the two maps. Admission always consults
//! the ignore map first, so once a path is ignored it stays ignored.
//!
//! The tracker is synchronous and does no buffering: every event is fully
//! processed before the call returns.

pub mod normalize;
pub mod pending;

pub use normalize::{normalize, NormalizedPath};
pub use pending::PendingCreation;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::engine::{TraceEvent, TraceEventKind};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::process::{ProcessInfo, ProcessInspector};
use crate::rules::{RuleMatch, Rules};

/// Behaviour switches for admission.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackerOptions {
    /// Capture the opening process's command line for tracked files.
    pub process_info: bool,
}

/// What `admit_opened` decided for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Not an existing regular file (directory, symlink, missing).
    NotAFile,
    AlreadyIgnored,
    AlreadyTracked,
    /// Matched an exclude rule and went to the ignore map.
    Excluded,
    Tracked,
    /// Tracked, and a kill rule asked the owning process to terminate.
    TrackedAndKilled,
}

/// Counters for the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    pub opened_events: usize,
    pub created_events: usize,
    pub termination_requests: usize,
    pub abandoned_creations: usize,
}

pub struct Tracker {
    fs: Arc<dyn FileSystem>,
    processes: Arc<dyn ProcessInspector>,
    rules: Rules,
    options: TrackerOptions,
    tracked: BTreeMap<NormalizedPath, Option<ProcessInfo>>,
    ignored: BTreeSet<NormalizedPath>,
    late_ignored: BTreeSet<NormalizedPath>,
    pending: PendingCreation,
    stats: TrackerStats,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("tracked", &self.tracked.len())
            .field("ignored", &self.ignored.len())
            .field("pending", &self.pending.get())
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl Tracker {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        processes: Arc<dyn ProcessInspector>,
        rules: Rules,
        options: TrackerOptions,
    ) -> Self {
        Self {
            fs,
            processes,
            rules,
            options,
            tracked: BTreeMap::new(),
            ignored: BTreeSet::new(),
            late_ignored: BTreeSet::new(),
            pending: PendingCreation::new(),
            stats: TrackerStats::default(),
        }
    }

    /// Tracked files in key order.
    pub fn tracked(&self) -> &BTreeMap<NormalizedPath, Option<ProcessInfo>> {
        &self.tracked
    }

    /// Ignored files in key order.
    pub fn ignored(&self) -> &BTreeSet<NormalizedPath> {
        &self.ignored
    }

    /// Tracked files for which a creation event resolved only after they
    /// had been admitted.
    pub fn late_ignored(&self) -> &BTreeSet<NormalizedPath> {
        &self.late_ignored
    }

    pub fn is_tracked(&self, path: &str) -> bool {
        self.tracked.contains_key(&normalize(path))
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignored.contains(&normalize(path))
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.get()
    }

    pub fn stats(&self) -> TrackerStats {
        self.stats
    }

    pub fn filesystem(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Dispatch a trace event to the matching operation.
    pub fn apply(&mut self, event: &TraceEvent) -> Result<()> {
        match event.kind {
            TraceEventKind::Opened => self.admit_opened(&event.path, event.pid).map(|_| ()),
            TraceEventKind::Created => self.notify_created(&event.path),
        }
    }

    /// Decide whether an opened file is a build input.
    ///
    /// Order matters: pending flush, file check, normalize, ignore map,
    /// tracked map, exclude rules, insert, kill rules.
    pub fn admit_opened(&mut self, path: &str, pid: i32) -> Result<Admission> {
        self.stats.opened_events += 1;
        self.flush_pending();

        if !self.fs.is_regular_file(Path::new(path)) {
            return Ok(Admission::NotAFile);
        }

        let key = normalize(path);

        if self.ignored.contains(&key) {
            return Ok(Admission::AlreadyIgnored);
        }
        if self.tracked.contains_key(&key) {
            return Ok(Admission::AlreadyTracked);
        }

        if let RuleMatch::Match { index } = self.rules.exclude.evaluate(key.as_str())? {
            debug!(
                path = %key,
                rule = self.rules.exclude.pattern(index).unwrap_or_default(),
                "excluded by rule"
            );
            self.ignored.insert(key);
            return Ok(Admission::Excluded);
        }

        let info = self
            .options
            .process_info
            .then(|| ProcessInfo::capture(self.processes.as_ref(), pid));
        debug!(path = %key, pid, "tracking file");
        self.tracked.insert(key.clone(), info);

        match self.rules.kill.evaluate(key.as_str())? {
            RuleMatch::Match { index } => {
                warn!(
                    path = %key,
                    pid,
                    rule = self.rules.kill.pattern(index).unwrap_or_default(),
                    "kill rule matched; requesting termination"
                );
                self.processes.request_termination(pid);
                self.stats.termination_requests += 1;
                Ok(Admission::TrackedAndKilled)
            }
            RuleMatch::NoMatch => Ok(Admission::Tracked),
        }
    }

    /// Record a created file so it never becomes a build input.
    ///
    /// If the file is not visible yet it is parked in the pending slot and
    /// resolved by the next event.
    pub fn notify_created(&mut self, path: &str) -> Result<()> {
        self.stats.created_events += 1;
        self.flush_pending();

        if self.fs.is_regular_file(Path::new(path)) {
            self.resolve_created(path);
        } else if let Some(abandoned) = self.pending.replace(path.to_string()) {
            self.stats.abandoned_creations += 1;
            debug!(path = %abandoned, "pending creation never became visible; dropping");
        }
        Ok(())
    }

    /// Final flush at the end of a run.
    ///
    /// Gives a pending creation one last chance to resolve; if the file is
    /// still not there it is dropped.
    pub fn finish(&mut self) {
        self.flush_pending();
        if let Some(abandoned) = self.pending.clear() {
            self.stats.abandoned_creations += 1;
            debug!(path = %abandoned, "pending creation unresolved at end of run");
        }
        info!(
            tracked = self.tracked.len(),
            ignored = self.ignored.len(),
            late_ignored = self.late_ignored.len(),
            "tracking session finished"
        );
    }

    fn flush_pending(&mut self) {
        if let Some(path) = self.pending.take_if_ready(self.fs.as_ref()) {
            self.resolve_created(&path);
        }
    }

    fn resolve_created(&mut self, path: &str) {
        let key = normalize(path);
        if self.tracked.contains_key(&key) {
            debug!(path = %key, "created file was already tracked");
            self.late_ignored.insert(key);
        } else if self.ignored.insert(key.clone()) {
            debug!(path = %key, "ignoring created file");
        }
    }
}
