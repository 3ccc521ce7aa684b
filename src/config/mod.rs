// src/config/mod.rs

//! Configuration loading and validation for deptrace.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_raw_or_default};
pub use model::{ConfigFile, RawConfigFile, ReportSection, RulesSection};
pub use validate::validate_raw_config;
