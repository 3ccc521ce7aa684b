// src/engine/feed.rs

//! Tracer feed: the line protocol between a syscall tracer and the engine.
//!
//! ```text
//! open\t<pid>\t<path>
//! create\t<pid>\t<path>
//! ```
//!
//! Blank lines and `#` comments are skipped. Relative paths are resolved
//! against the owning process's working directory before they reach the
//! tracker, which only ever normalizes lexically.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::{SessionEvent, TraceEvent, TraceEventKind};
use crate::process::ProcessInspector;

/// Parse one feed line. `Ok(None)` for blank and comment lines.
pub fn parse_feed_line(line: &str) -> std::result::Result<Option<TraceEvent>, String> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.trim().is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.splitn(3, '\t');
    let kind = match fields.next().map(str::trim) {
        Some("open") | Some("opened") => TraceEventKind::Opened,
        Some("create") | Some("created") => TraceEventKind::Created,
        Some(other) => return Err(format!("unknown event kind {other:?}")),
        None => return Err("empty event".to_string()),
    };
    let pid = fields
        .next()
        .ok_or_else(|| "missing pid".to_string())?
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid pid: {e}"))?;
    if pid <= 0 {
        return Err(format!("pid must be positive, got {pid}"));
    }
    let path = fields.next().ok_or_else(|| "missing path".to_string())?;
    if path.is_empty() {
        return Err("empty path".to_string());
    }

    Ok(Some(TraceEvent {
        kind,
        pid,
        path: path.to_string(),
    }))
}

/// Make the event's path absolute.
///
/// Returns `None` when the path is relative and the process's working
/// directory cannot be read (typically because it already exited).
pub fn resolve_event_path(
    mut event: TraceEvent,
    inspector: &dyn ProcessInspector,
) -> Option<TraceEvent> {
    if event.path.starts_with('/') {
        return Some(event);
    }

    match inspector.working_dir(event.pid) {
        Ok(cwd) => {
            event.path = format!("{}/{}", cwd.to_string_lossy(), event.path);
            Some(event)
        }
        Err(err) => {
            warn!(
                pid = event.pid,
                path = %event.path,
                error = %err,
                "cannot resolve relative path; dropping event"
            );
            None
        }
    }
}

/// Spawn a task that reads feed lines from `reader` and forwards them.
///
/// Sends [`SessionEvent::FeedClosed`] when the input ends, including when
/// reading fails. Malformed lines are logged and skipped.
pub fn spawn_feed_reader<R>(
    reader: R,
    inspector: Arc<dyn ProcessInspector>,
    tx: mpsc::Sender<SessionEvent>,
) -> JoinHandle<Result<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let result = pump_feed(reader, inspector.as_ref(), &tx).await;
        if let Ok(lines) = &result {
            info!(lines, "tracer feed closed");
        }
        let _ = tx.send(SessionEvent::FeedClosed).await;
        result.map(|_| ())
    })
}

/// Forward every event in `reader`. Returns the number of lines read.
async fn pump_feed<R>(
    reader: R,
    inspector: &dyn ProcessInspector,
    tx: &mpsc::Sender<SessionEvent>,
) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .context("reading tracer feed")?;
        if n == 0 {
            return Ok(line_no);
        }
        line_no += 1;

        let line = String::from_utf8_lossy(&buf);
        let event = match parse_feed_line(&line) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(reason) => {
                warn!(line = line_no, %reason, "skipping malformed feed line");
                continue;
            }
        };

        let Some(event) = resolve_event_path(event, inspector) else {
            continue;
        };

        debug!(?event, "feed event");
        if tx.send(SessionEvent::Trace(event)).await.is_err() {
            debug!("runtime gone; stopping feed reader");
            return Ok(line_no);
        }
    }
}
