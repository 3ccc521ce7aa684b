// src/tracker/normalize.rs

//! Lexical path normalization.
//!
//! Everything in the tracker is keyed by [`NormalizedPath`]. Normalization is
//! purely textual: symlinks are not followed and the path does not need to
//! exist.

use std::borrow::Borrow;
use std::fmt;
use std::path::Path;

/// An absolute, slash-separated path with no `.`/`..` segments and no
/// duplicate slashes. Never empty; always starts with `/`.
///
/// Ordering is byte-wise, which is the order reports are written in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

impl AsRef<str> for NormalizedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NormalizedPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Normalize an absolute path.
///
/// Segments are walked left to right: empty and `.` segments are dropped,
/// `..` pops the last retained segment (and is a no-op at the root). If all
/// segments cancel out the result is `/`.
///
/// A relative input is treated as if it were rooted at `/`; callers resolve
/// relative paths against a working directory before getting here.
pub fn normalize(path: &str) -> NormalizedPath {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return NormalizedPath("/".to_string());
    }

    let len = segments.iter().map(|s| s.len() + 1).sum();
    let mut out = String::with_capacity(len);
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }
    NormalizedPath(out)
}
