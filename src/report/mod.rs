// src/report/mod.rs

//! Dependency and ignore reports.
//!
//! Tracked report: one record per line, tab separated:
//!
//! ```text
//! [<32 hex md5>\t]<path with $VAR substitution>[\t<command line> (<pid>)]
//! ```
//!
//! Ignore report: one substituted path per line.

pub mod digest;
pub mod substitute;
pub mod writer;

pub use digest::{hash_file, ContentDigest};
pub use substitute::{expand_path, ProcessEnv, Substitutions, VarSource};
pub use writer::{
    format_tracked_record, write_reports, ReportOptions, ReportSummary, ReportTargets,
};
