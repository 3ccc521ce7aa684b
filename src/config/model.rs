// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::report::ReportOptions;
use crate::tracker::TrackerOptions;
use crate::types::RuleSyntax;

/// Raw configuration exactly as deserialized from TOML.
///
/// ```toml
/// [rules]
/// exclude = "rules/exclude.txt"
/// kill = "rules/kill.txt"
/// syntax = "basic"
///
/// [report]
/// tracked = "deptrace.deps"
/// ignored = "deptrace.ignored"
/// checksum = true
/// process_info = false
/// substitute_env = ["HOME"]
/// ```
///
/// All sections are optional and have reasonable defaults. Use
/// `ConfigFile::try_from` to get a validated configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub rules: RulesSection,

    #[serde(default)]
    pub report: ReportSection,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub rules: RulesSection,
    pub report: ReportSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(rules: RulesSection, report: ReportSection) -> Self {
        Self { rules, report }
    }

    pub fn tracker_options(&self) -> TrackerOptions {
        TrackerOptions {
            process_info: self.report.process_info,
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            checksum: self.report.checksum,
            process_info: self.report.process_info,
            warn_tracked_ignored: self.report.warn_tracked_ignored,
            exclude_tracked_ignored: self.report.exclude_tracked_ignored,
        }
    }
}

/// `[rules]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RulesSection {
    /// File with exclude patterns, one per line.
    #[serde(default)]
    pub exclude: Option<PathBuf>,

    /// File with kill patterns, one per line.
    #[serde(default)]
    pub kill: Option<PathBuf>,

    /// `"basic"` (default) or `"extended"` POSIX syntax.
    #[serde(default)]
    pub syntax: RuleSyntax,

    /// Fail instead of warning when a rule file exceeds the legacy limit.
    #[serde(default)]
    pub strict_rule_limit: bool,
}

/// `[report]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSection {
    /// Where the tracked report goes; no tracked report if unset.
    #[serde(default)]
    pub tracked: Option<PathBuf>,

    /// Where the ignore report goes; no ignore report if unset.
    #[serde(default)]
    pub ignored: Option<PathBuf>,

    #[serde(default = "default_checksum")]
    pub checksum: bool,

    #[serde(default)]
    pub process_info: bool,

    /// Environment variables whose values are replaced by `$NAME` in
    /// report paths, in priority order.
    #[serde(default)]
    pub substitute_env: Vec<String>,

    #[serde(default)]
    pub warn_tracked_ignored: bool,

    #[serde(default)]
    pub exclude_tracked_ignored: bool,
}

fn default_checksum() -> bool {
    true
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            tracked: None,
            ignored: None,
            checksum: default_checksum(),
            process_info: false,
            substitute_env: Vec::new(),
            warn_tracked_ignored: false,
            exclude_tracked_ignored: false,
        }
    }
}
