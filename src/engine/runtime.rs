// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::tracker::Tracker;

use super::SessionEvent;

/// What happened during a recording session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeSummary {
    pub events: usize,
    pub failed_events: usize,
    pub interrupted: bool,
}

/// Drives the tracker in response to `SessionEvent`s.
///
/// This is a pure IO shell around [`Tracker`], which holds all the
/// semantics. The runtime is the only owner of the tracker, so events are
/// applied strictly one after another.
pub struct Runtime {
    tracker: Tracker,
    event_rx: mpsc::Receiver<SessionEvent>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(tracker: Tracker, event_rx: mpsc::Receiver<SessionEvent>) -> Self {
        Self { tracker, event_rx }
    }

    /// Main event loop.
    ///
    /// Runs until the feed closes, shutdown is requested, or every sender is
    /// dropped. A failing event is logged and does not stop the session.
    /// The tracker is finished and handed back for report writing.
    pub async fn run(mut self) -> (Tracker, RuntimeSummary) {
        info!("deptrace recording started");
        let mut summary = RuntimeSummary::default();

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("session event channel closed; finishing");
                    break;
                }
            };

            match event {
                SessionEvent::Trace(trace) => {
                    summary.events += 1;
                    if let Err(err) = self.tracker.apply(&trace) {
                        summary.failed_events += 1;
                        warn!(?trace, error = %err, "failed to process trace event");
                    }
                }
                SessionEvent::FeedClosed => {
                    debug!("feed closed; finishing");
                    break;
                }
                SessionEvent::ShutdownRequested => {
                    info!("shutdown requested; finishing");
                    summary.interrupted = true;
                    break;
                }
            }
        }

        self.tracker.finish();
        (self.tracker, summary)
    }
}
