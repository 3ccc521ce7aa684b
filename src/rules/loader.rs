// src/rules/loader.rs

use std::io::Read;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::errors::{DeptraceError, Result};
use crate::fs::FileSystem;
use crate::config::RulesSection;
use crate::rules::{PathMatcher, RegexRule, RuleSet, Rules};
use crate::types::RuleSyntax;

/// Maximum number of rules per file that older rule consumers accepted.
///
/// Longer files are still loaded in full; crossing the limit is only a
/// warning unless the strict limit is requested.
pub const LEGACY_RULE_LIMIT: usize = 1000;

/// Split rule file text into `(line_number, pattern)` pairs.
///
/// One pattern per line, top to bottom. A trailing `\r` is stripped and
/// empty lines are skipped. Line numbers are 1-based.
pub fn parse_rules(text: &str) -> Vec<(usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.strip_suffix('\r').unwrap_or(line)))
        .filter(|(_, line)| !line.is_empty())
        .collect()
}

/// Load and compile a rule file.
///
/// A missing or unreadable file, an invalid pattern, or (with
/// `strict_limit`) more than [`LEGACY_RULE_LIMIT`] rules are all errors.
pub fn load_rule_file(
    fs: &dyn FileSystem,
    path: &Path,
    label: &str,
    syntax: RuleSyntax,
    strict_limit: bool,
) -> Result<RuleSet> {
    let mut text = String::new();
    fs.open_read(path)
        .and_then(|mut reader| reader.read_to_string(&mut text))
        .map_err(DeptraceError::io("reading rule file", path))?;

    let entries = parse_rules(&text);

    if entries.len() > LEGACY_RULE_LIMIT {
        if strict_limit {
            return Err(DeptraceError::CapacityError {
                path: path.to_path_buf(),
                count: entries.len(),
                limit: LEGACY_RULE_LIMIT,
            });
        }
        warn!(
            file = ?path,
            count = entries.len(),
            limit = LEGACY_RULE_LIMIT,
            "rule file exceeds the legacy rule limit; loading all rules"
        );
    }

    let mut rules: Vec<Box<dyn PathMatcher>> = Vec::with_capacity(entries.len());
    for (line, pattern) in entries {
        let rule = RegexRule::compile(pattern, syntax).map_err(|err| match err {
            DeptraceError::RegexError { message, .. } => DeptraceError::RegexError {
                origin: format!("{:?} line {line} ({pattern:?})", path),
                message,
            },
            other => other,
        })?;
        debug!(file = ?path, line, pattern, "compiled {label} rule");
        rules.push(Box::new(rule));
    }

    info!(file = ?path, count = rules.len(), "loaded {label} rules");
    Ok(RuleSet::from_matchers(label, rules))
}

/// Load both rule sets named by a `[rules]` section.
///
/// An unset file yields an empty set.
pub fn load_configured_rules(fs: &dyn FileSystem, section: &RulesSection) -> Result<Rules> {
    let load = |path: Option<&Path>, label: &str| match path {
        Some(path) => load_rule_file(fs, path, label, section.syntax, section.strict_rule_limit),
        None => {
            debug!("no {label} rule file configured");
            Ok(RuleSet::empty(label))
        }
    };

    let exclude = load(section.exclude.as_deref(), "exclude")?;
    let kill = load(section.kill.as_deref(), "kill")?;
    Ok(Rules::new(exclude, kill))
}
