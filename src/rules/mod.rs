// src/rules/mod.rs

//! Exclude and kill rules.
//!
//! A [`RuleSet`] is an ordered list of precompiled path matchers. Rules are
//! evaluated in load order and the first match wins. Two independent sets
//! exist per session:
//!
//! - exclude rules: matching paths go to the ignore map instead of being
//!   tracked;
//! - kill rules: a match on a freshly tracked path asks the owning process
//!   to terminate.

pub mod loader;
pub mod posix;

pub use loader::{load_configured_rules, load_rule_file, parse_rules, LEGACY_RULE_LIMIT};

use std::fmt;

use regex::Regex;

use crate::errors::{DeptraceError, Result};
use crate::types::RuleSyntax;

/// Result of evaluating a rule set against a path.
///
/// Matcher faults are reported through `Err`, never as `NoMatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMatch {
    /// The rule at `index` (load order) was the first to match.
    Match { index: usize },
    NoMatch,
}

/// A single compiled path pattern.
pub trait PathMatcher: Send + Sync + fmt::Debug {
    /// The pattern as written in the rule file.
    fn pattern(&self) -> &str;

    /// Test the pattern against `path`. An `Err` means the matcher itself
    /// failed; it must not be treated as a non-match.
    fn is_match(&self, path: &str) -> Result<bool>;
}

/// Production matcher: a POSIX pattern translated into a `regex::Regex`.
#[derive(Debug, Clone)]
pub struct RegexRule {
    source: String,
    regex: Regex,
}

impl RegexRule {
    pub fn compile(pattern: &str, syntax: RuleSyntax) -> Result<Self> {
        let translated = posix::translate(pattern, syntax).map_err(|message| {
            DeptraceError::RegexError {
                origin: format!("pattern {pattern:?}"),
                message,
            }
        })?;
        let regex = Regex::new(&translated).map_err(|err| DeptraceError::RegexError {
            origin: format!("pattern {pattern:?}"),
            message: err.to_string(),
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }
}

impl PathMatcher for RegexRule {
    fn pattern(&self) -> &str {
        &self.source
    }

    fn is_match(&self, path: &str) -> Result<bool> {
        Ok(self.regex.is_match(path))
    }
}

/// Ordered, immutable list of compiled rules.
pub struct RuleSet {
    label: String,
    rules: Vec<Box<dyn PathMatcher>>,
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("label", &self.label)
            .field("len", &self.rules.len())
            .finish_non_exhaustive()
    }
}

impl RuleSet {
    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            rules: Vec::new(),
        }
    }

    pub fn from_matchers(label: impl Into<String>, rules: Vec<Box<dyn PathMatcher>>) -> Self {
        Self {
            label: label.into(),
            rules,
        }
    }

    /// Compile `patterns` in order.
    pub fn from_patterns<I, S>(label: impl Into<String>, patterns: I, syntax: RuleSyntax) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = patterns
            .into_iter()
            .map(|p| {
                RegexRule::compile(p.as_ref(), syntax)
                    .map(|rule| Box::new(rule) as Box<dyn PathMatcher>)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_matchers(label, rules))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Pattern text of the rule at `index`.
    pub fn pattern(&self, index: usize) -> Option<&str> {
        self.rules.get(index).map(|r| r.pattern())
    }

    /// Evaluate rules in load order; the first match wins.
    pub fn evaluate(&self, path: &str) -> Result<RuleMatch> {
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.is_match(path).map_err(|err| match err {
                DeptraceError::RegexError { message, .. } => DeptraceError::RegexError {
                    origin: format!("{} rule {:?}", self.label, rule.pattern()),
                    message,
                },
                other => other,
            })? {
                return Ok(RuleMatch::Match { index });
            }
        }
        Ok(RuleMatch::NoMatch)
    }
}

/// The two rule sets consulted during admission.
#[derive(Debug)]
pub struct Rules {
    pub exclude: RuleSet,
    pub kill: RuleSet,
}

impl Rules {
    pub fn new(exclude: RuleSet, kill: RuleSet) -> Self {
        Self { exclude, kill }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new(RuleSet::empty("exclude"), RuleSet::empty("kill"))
    }
}
