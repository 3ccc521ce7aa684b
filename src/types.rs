use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Regular-expression dialect used by rule files.
///
/// - `Basic`: POSIX basic regular expressions (the historical format of rule
///   files). `\(`, `\)`, `\{`, `\}` and `\|` are operators; bare parens,
///   braces, `+`, `?` and `|` match themselves.
/// - `Extended`: POSIX extended regular expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleSyntax {
    #[default]
    Basic,
    Extended,
}

impl FromStr for RuleSyntax {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" | "bre" => Ok(RuleSyntax::Basic),
            "extended" | "ere" => Ok(RuleSyntax::Extended),
            other => Err(format!(
                "invalid rule syntax: {other} (expected \"basic\" or \"extended\")"
            )),
        }
    }
}

/// Outcome of comparing a previous dependency report against the current
/// filesystem.
///
/// `NoChangesFound` is a distinct success value, not merely "false".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// At least one input changed or disappeared (or there is no baseline).
    ChangesFound,
    /// Every recorded input still has the recorded content.
    NoChangesFound,
    /// The report could not be evaluated.
    Error,
}

impl Verdict {
    /// Process exit code used by the `check` command.
    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::ChangesFound => 0,
            Verdict::Error => 1,
            Verdict::NoChangesFound => 2,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::ChangesFound => "changes found",
            Verdict::NoChangesFound => "no changes found",
            Verdict::Error => "error",
        };
        f.write_str(s)
    }
}
