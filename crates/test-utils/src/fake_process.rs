use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use deptrace::process::ProcessInspector;

#[derive(Debug, Default)]
struct FakeState {
    command_lines: HashMap<i32, Vec<u8>>,
    working_dirs: HashMap<i32, PathBuf>,
    terminated: Vec<i32>,
}

/// A fake process inspector that:
/// - serves command lines and working directories from in-memory tables
/// - records every termination request instead of sending signals.
///
/// Clones share state, so a test can keep a handle after giving one to the
/// tracker.
#[derive(Debug, Clone, Default)]
pub struct FakeProcessInspector {
    state: Arc<Mutex<FakeState>>,
}

impl FakeProcessInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `args` as the argv of `pid`.
    pub fn with_command_line(self, pid: i32, args: &[&str]) -> Self {
        self.state
            .lock()
            .unwrap()
            .command_lines
            .insert(pid, args.join("\0").into_bytes());
        self
    }

    pub fn with_working_dir(self, pid: i32, dir: impl AsRef<Path>) -> Self {
        self.state
            .lock()
            .unwrap()
            .working_dirs
            .insert(pid, dir.as_ref().to_path_buf());
        self
    }

    /// Pids that were asked to terminate, in request order.
    pub fn terminated(&self) -> Vec<i32> {
        self.state.lock().unwrap().terminated.clone()
    }
}

impl ProcessInspector for FakeProcessInspector {
    fn command_line(&self, pid: i32) -> io::Result<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .command_lines
            .get(&pid)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no process {pid}")))
    }

    fn working_dir(&self, pid: i32) -> io::Result<PathBuf> {
        self.state
            .lock()
            .unwrap()
            .working_dirs
            .get(&pid)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no process {pid}")))
    }

    fn request_termination(&self, pid: i32) {
        self.state.lock().unwrap().terminated.push(pid);
    }
}
