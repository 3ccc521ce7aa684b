// src/tracker/pending.rs

//! Single-slot buffer for "file created" events that raced the filesystem.

use std::path::Path;

use crate::fs::FileSystem;

/// The most recent created path whose disposition is not settled yet.
///
/// At most one path is held. It is re-checked by the next event of any kind
/// and moved to the ignore map once it shows up as a regular file.
#[derive(Debug, Default)]
pub struct PendingCreation {
    slot: Option<String>,
}

impl PendingCreation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&str> {
        self.slot.as_deref()
    }

    /// Take the pending path if it now denotes a regular, non-symlink file.
    ///
    /// The slot is left untouched otherwise.
    pub fn take_if_ready(&mut self, fs: &dyn FileSystem) -> Option<String> {
        match self.slot.as_deref() {
            Some(path) if fs.is_regular_file(Path::new(path)) => self.slot.take(),
            _ => None,
        }
    }

    /// Park `path`, returning whatever unresolved path it displaces.
    pub fn replace(&mut self, path: String) -> Option<String> {
        self.slot.replace(path)
    }

    pub fn clear(&mut self) -> Option<String> {
        self.slot.take()
    }
}
