// src/engine/mod.rs

//! Recording engine.
//!
//! The synchronous core is [`crate::tracker::Tracker`]; this module is the
//! IO shell around it:
//! - [`feed`] turns tracer output lines into [`TraceEvent`]s,
//! - [`runtime`] owns the tracker and applies events one at a time until
//!   the feed closes or shutdown is requested.

pub mod feed;
pub mod runtime;

pub use feed::{parse_feed_line, resolve_event_path, spawn_feed_reader};
pub use runtime::{Runtime, RuntimeSummary};

/// Kind of filesystem observation reported by the tracer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEventKind {
    /// A process opened an existing file.
    Opened,
    /// A process created a file.
    Created,
}

/// A single observation: `pid` opened or created `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    pub kind: TraceEventKind,
    pub pid: i32,
    pub path: String,
}

impl TraceEvent {
    pub fn opened(pid: i32, path: impl Into<String>) -> Self {
        Self {
            kind: TraceEventKind::Opened,
            pid,
            path: path.into(),
        }
    }

    pub fn created(pid: i32, path: impl Into<String>) -> Self {
        Self {
            kind: TraceEventKind::Created,
            pid,
            path: path.into(),
        }
    }
}

/// Events flowing into the runtime.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Trace(TraceEvent),
    /// The tracer's output ended.
    FeedClosed,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}
