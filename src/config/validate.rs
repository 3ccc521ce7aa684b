// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DeptraceError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::DeptraceError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.rules, raw.report))
    }
}

pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_substitutions(cfg)?;
    validate_report_targets(cfg)?;
    Ok(())
}

fn validate_substitutions(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for name in cfg.report.substitute_env.iter() {
        if name.is_empty() {
            return Err(DeptraceError::ConfigError(
                "[report].substitute_env must not contain empty names".to_string(),
            ));
        }
        if name.contains(['/', '$']) {
            return Err(DeptraceError::ConfigError(format!(
                "[report].substitute_env entry '{}' must not contain '/' or '$'",
                name
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(DeptraceError::ConfigError(format!(
                "[report].substitute_env lists '{}' more than once",
                name
            )));
        }
    }
    Ok(())
}

fn validate_report_targets(cfg: &RawConfigFile) -> Result<()> {
    if let (Some(tracked), Some(ignored)) = (&cfg.report.tracked, &cfg.report.ignored) {
        if tracked == ignored {
            return Err(DeptraceError::ConfigError(format!(
                "[report].tracked and [report].ignored both point to {:?}",
                tracked
            )));
        }
    }
    Ok(())
}
