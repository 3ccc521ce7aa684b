// src/process/mod.rs

//! Access to traced processes.
//!
//! The tracker never talks to the OS about processes directly. It goes
//! through a [`ProcessInspector`], which production code backs with
//! `/proc` and `kill(2)` and tests back with a recording fake.

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::PathBuf;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::{debug, warn};

/// Command line of the process that first opened a tracked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: i32,
    /// Raw argv as found in `/proc/<pid>/cmdline` (NUL separated).
    pub command_line: Vec<u8>,
}

impl ProcessInfo {
    pub fn new(pid: i32, command_line: impl Into<Vec<u8>>) -> Self {
        Self {
            pid,
            command_line: command_line.into(),
        }
    }

    /// Capture process info for `pid`.
    ///
    /// A process that is already gone yields an empty command line rather
    /// than an error.
    pub fn capture(inspector: &dyn ProcessInspector, pid: i32) -> Self {
        match inspector.command_line(pid) {
            Ok(command_line) => Self { pid, command_line },
            Err(err) => {
                debug!(pid, error = %err, "could not read command line");
                Self {
                    pid,
                    command_line: Vec::new(),
                }
            }
        }
    }

    /// Arguments joined by single spaces, with tabs and newlines flattened
    /// so the result fits in one report column.
    pub fn display_command_line(&self) -> String {
        let joined = self
            .command_line
            .split(|b| *b == 0)
            .filter(|arg| !arg.is_empty())
            .map(String::from_utf8_lossy)
            .collect::<Vec<_>>()
            .join(" ");
        joined.replace(['\t', '\n', '\r'], " ")
    }

    /// Report column: `<command line> (<pid>)`.
    pub fn render(&self) -> String {
        format!("{} ({})", self.display_command_line(), self.pid)
    }
}

pub trait ProcessInspector: Send + Sync + Debug {
    fn command_line(&self, pid: i32) -> io::Result<Vec<u8>>;
    fn working_dir(&self, pid: i32) -> io::Result<PathBuf>;
    /// Ask `pid` to terminate. Fire-and-forget: no wait, no retry, and
    /// delivery failures are not reported.
    fn request_termination(&self, pid: i32);
}

/// Inspector backed by procfs and `SIGTERM`.
#[derive(Debug, Clone)]
pub struct ProcfsInspector {
    proc_root: PathBuf,
}

impl ProcfsInspector {
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }
}

impl Default for ProcfsInspector {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcessInspector for ProcfsInspector {
    fn command_line(&self, pid: i32) -> io::Result<Vec<u8>> {
        let mut raw = fs::read(self.proc_root.join(pid.to_string()).join("cmdline"))?;
        while raw.last() == Some(&0) {
            raw.pop();
        }
        Ok(raw)
    }

    fn working_dir(&self, pid: i32) -> io::Result<PathBuf> {
        fs::read_link(self.proc_root.join(pid.to_string()).join("cwd"))
    }

    fn request_termination(&self, pid: i32) {
        let Some(target) = signal_target(pid) else {
            warn!(pid, "refusing to signal a process group or every process");
            return;
        };
        if let Err(err) = kill(target, Signal::SIGTERM) {
            debug!(pid, error = %err, "termination request not delivered");
        }
    }
}

/// The single process `pid` names, if any.
///
/// `kill(2)` treats `0` and negative pids as process groups or as "every
/// process", so those never map to a target.
pub fn signal_target(pid: i32) -> Option<Pid> {
    (pid > 0).then(|| Pid::from_raw(pid))
}
