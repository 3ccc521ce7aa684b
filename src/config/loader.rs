// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DeptraceError, Result};

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for
/// the checked form.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents =
        fs::read_to_string(path).map_err(DeptraceError::io("reading config", path))?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load the raw config for a command.
///
/// An explicitly requested file must exist. Without one, `Deptrace.toml` in
/// the current directory is used if present and defaults otherwise.
pub fn load_raw_or_default(explicit: Option<&Path>) -> Result<RawConfigFile> {
    match explicit {
        Some(path) => load_from_path(path),
        None => {
            let path = default_config_path();
            if path.exists() {
                load_from_path(&path)
            } else {
                debug!(?path, "no config file; using defaults");
                Ok(RawConfigFile::default())
            }
        }
    }
}

/// Default config location: `Deptrace.toml` in the current directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Deptrace.toml")
}
