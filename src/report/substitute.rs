// src/report/substitute.rs

//! Environment-variable placeholders in report paths.
//!
//! Reports are made portable by rewriting a path prefix that equals the
//! value of a configured variable as `$NAME`. When a report is read back the
//! placeholders are expanded against the current environment.
//!
//! Placeholder syntax: `$NAME`, where `NAME` runs up to the next `/` or the
//! end of the string. A literal `$` in a path is written as `$$`.

use std::collections::{BTreeMap, HashMap};

use crate::errors::{DeptraceError, Result};

/// Source of environment variable values.
pub trait VarSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl VarSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl VarSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl VarSource for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Ordered `(name, value)` pairs resolved once per report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    pairs: Vec<(String, String)>,
}

impl Substitutions {
    pub fn none() -> Self {
        Self::default()
    }

    /// Look up every configured name. An unset variable is an error.
    pub fn resolve<S: AsRef<str>>(names: &[S], vars: &dyn VarSource) -> Result<Self> {
        let pairs = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                vars.var(name)
                    .map(|value| (name.to_string(), value))
                    .ok_or_else(|| DeptraceError::EnvError(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { pairs })
    }

    /// Replace the first matching variable prefix with `$NAME`.
    ///
    /// A prefix only matches on a segment boundary, and values that are
    /// empty (or just `/`) never match. Literal `$` in the remaining path is
    /// doubled, so the result always expands back to the same file.
    pub fn render_path(&self, path: &str) -> String {
        for (name, value) in &self.pairs {
            let prefix = value.trim_end_matches('/');
            if prefix.is_empty() {
                continue;
            }
            if let Some(rest) = path.strip_prefix(prefix) {
                if rest.is_empty() || rest.starts_with('/') {
                    return format!("${name}{}", escape_dollars(rest));
                }
            }
        }
        escape_dollars(path)
    }
}

fn escape_dollars(text: &str) -> String {
    text.replace('$', "$$")
}

/// Expand every `$NAME` placeholder in `text`, and `$$` to `$`.
///
/// Fails with [`DeptraceError::EnvError`] if a referenced variable is unset.
pub fn expand_path(text: &str, vars: &dyn VarSource) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }
        let end = after.find('/').unwrap_or(after.len());
        let name = &after[..end];
        let value = vars
            .var(name)
            .ok_or_else(|| DeptraceError::EnvError(name.to_string()))?;
        out.push_str(&value);
        rest = &after[end..];
    }

    out.push_str(rest);
    Ok(out)
}
