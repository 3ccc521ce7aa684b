// src/errors.rs

//! Crate-wide error type and result alias.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeptraceError {
    #[error("IO error while {action} {path:?}: {source}")]
    IoError {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Regex error in {origin}: {message}")]
    RegexError { origin: String, message: String },

    #[error("Environment variable '{0}' is not set in the current environment")]
    EnvError(String),

    #[error("Too many rules in {path:?}: {count} (limit is {limit})")]
    CapacityError {
        path: PathBuf,
        count: usize,
        limit: usize,
    },

    #[error("Malformed record at {path:?} line {line}: {reason}")]
    ReportError {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DeptraceError {
    /// Build a `map_err` adapter that attaches the action and path to an
    /// `io::Error`.
    pub fn io(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| DeptraceError::IoError {
            action,
            path,
            source,
        }
    }

    /// True for IO failures on a path that no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DeptraceError::IoError { source, .. } if source.kind() == io::ErrorKind::NotFound
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DeptraceError>;
