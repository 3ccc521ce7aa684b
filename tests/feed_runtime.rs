mod common;

use std::sync::Arc;

use deptrace::engine::{
    parse_feed_line, resolve_event_path, spawn_feed_reader, Runtime, SessionEvent, TraceEvent,
    TraceEventKind,
};
use tokio::sync::mpsc;

use common::{init_tracing, FakeProcessInspector, TrackerBuilder};
use deptrace_test_utils::with_timeout;

#[test]
fn test_parse_feed_lines() {
    assert_eq!(
        parse_feed_line("open\t12\t/etc/hosts\n").unwrap(),
        Some(TraceEvent::opened(12, "/etc/hosts"))
    );
    assert_eq!(
        parse_feed_line("create\t3\tout/a b.o\r\n").unwrap(),
        Some(TraceEvent::created(3, "out/a b.o"))
    );
    // Tabs after the pid belong to the path.
    let event = parse_feed_line("open\t1\t/odd\tname").unwrap().unwrap();
    assert_eq!(event.kind, TraceEventKind::Opened);
    assert_eq!(event.path, "/odd\tname");
}

#[test]
fn test_comments_and_blank_lines_are_skipped() {
    assert_eq!(parse_feed_line("# strace -f make").unwrap(), None);
    assert_eq!(parse_feed_line("   \n").unwrap(), None);
}

#[test]
fn test_malformed_feed_lines() {
    assert!(parse_feed_line("stat\t1\t/x").is_err());
    assert!(parse_feed_line("open\tabc\t/x").is_err());
    assert!(parse_feed_line("open\t1").is_err());
    assert!(parse_feed_line("open\t1\t").is_err());
}

#[test]
fn test_non_positive_pids_are_rejected() {
    for line in ["open\t0\t/etc/secret", "open\t-1\t/etc/secret", "create\t-42\t/x"] {
        let err = parse_feed_line(line).unwrap_err();
        assert!(err.contains("positive"), "{line:?}: {err}");
    }
}

#[tokio::test]
async fn test_bad_pid_line_never_reaches_kill_rules() {
    let processes = FakeProcessInspector::new();
    let builder = TrackerBuilder::new()
        .with_processes(processes.clone())
        .kill("^/etc/");
    builder.fs().add_file("/etc/secret", Vec::new());
    let tracker = builder.build();

    let feed = "open\t-1\t/etc/secret\nopen\t0\t/etc/secret\nopen\t5\t/etc/secret\n";
    let (tx, rx) = mpsc::channel(4);
    let reader = spawn_feed_reader(feed.as_bytes(), Arc::new(processes.clone()), tx);

    let (tracker, summary) = with_timeout(Runtime::new(tracker, rx).run()).await;
    reader.await.unwrap().unwrap();

    assert_eq!(summary.events, 1);
    assert!(tracker.is_tracked("/etc/secret"));
    assert_eq!(processes.terminated(), vec![5]);
}

#[test]
fn test_relative_paths_resolve_against_process_cwd() {
    let processes = FakeProcessInspector::new().with_working_dir(7, "/home/u/project");

    let event = resolve_event_path(TraceEvent::opened(7, "src/../Makefile"), &processes).unwrap();
    assert_eq!(event.path, "/home/u/project/src/../Makefile");

    let absolute = resolve_event_path(TraceEvent::opened(8, "/etc/hosts"), &processes).unwrap();
    assert_eq!(absolute.path, "/etc/hosts");

    // Process 8 is gone, so its relative path cannot be placed.
    assert!(resolve_event_path(TraceEvent::opened(8, "Makefile"), &processes).is_none());
}

#[tokio::test]
async fn test_runtime_consumes_feed_until_closed() {
    init_tracing();
    let processes = FakeProcessInspector::new().with_working_dir(20, "/work");
    let builder = TrackerBuilder::new()
        .with_processes(processes.clone())
        .exclude("^/tmp/")
        .kill("^/secrets/");
    let fs = builder.fs();
    fs.add_file("/work/main.c", Vec::new());
    fs.add_file("/usr/include/stdio.h", Vec::new());
    fs.add_file("/tmp/cc1.s", Vec::new());
    fs.add_file("/secrets/token", Vec::new());
    let tracker = builder.build();

    let feed = "\
# recorded by the tracer
open\t20\tmain.c
open\t20\t/usr/include/../include/stdio.h
create\t21\t/work/main.o
open\t21\t/tmp/cc1.s
bogus line
open\t22\t/secrets/token
";
    // The compiler output already exists when its create event is read.
    fs.add_file("/work/main.o", Vec::new());

    let (tx, rx) = mpsc::channel(16);
    let reader = spawn_feed_reader(feed.as_bytes(), Arc::new(processes.clone()), tx);

    let (tracker, summary) = with_timeout(Runtime::new(tracker, rx).run()).await;
    reader.await.unwrap().unwrap();

    assert!(!summary.interrupted);
    assert_eq!(summary.events, 5);
    assert_eq!(summary.failed_events, 0);

    let tracked: Vec<&str> = tracker.tracked().keys().map(|k| k.as_str()).collect();
    assert_eq!(tracked, vec!["/secrets/token", "/usr/include/stdio.h", "/work/main.c"]);
    let ignored: Vec<&str> = tracker.ignored().iter().map(|k| k.as_str()).collect();
    assert_eq!(ignored, vec!["/tmp/cc1.s", "/work/main.o"]);
    assert_eq!(processes.terminated(), vec![22]);
}

#[tokio::test]
async fn test_shutdown_request_stops_the_session() {
    let builder = TrackerBuilder::new();
    builder.fs().add_file("/a", Vec::new());
    let tracker = builder.build();

    let (tx, rx) = mpsc::channel(4);
    tx.send(SessionEvent::Trace(TraceEvent::opened(1, "/a"))).await.unwrap();
    tx.send(SessionEvent::ShutdownRequested).await.unwrap();
    tx.send(SessionEvent::Trace(TraceEvent::opened(1, "/b"))).await.unwrap();

    let (tracker, summary) = with_timeout(Runtime::new(tracker, rx).run()).await;

    assert!(summary.interrupted);
    assert_eq!(summary.events, 1);
    assert!(tracker.is_tracked("/a"));
}

#[tokio::test]
async fn test_failed_event_does_not_end_the_session() {
    #[derive(Debug)]
    struct Broken;
    impl deptrace::rules::PathMatcher for Broken {
        fn pattern(&self) -> &str {
            "<broken>"
        }
        fn is_match(&self, _path: &str) -> deptrace::errors::Result<bool> {
            Err(deptrace::errors::DeptraceError::RegexError {
                origin: "test".to_string(),
                message: "boom".to_string(),
            })
        }
    }

    let builder = TrackerBuilder::new().exclude_matcher(Box::new(Broken));
    let fs = builder.fs();
    fs.add_file("/a", Vec::new());
    fs.add_file("/b", Vec::new());
    let tracker = builder.build();

    let (tx, rx) = mpsc::channel(4);
    tx.send(SessionEvent::Trace(TraceEvent::opened(1, "/a"))).await.unwrap();
    tx.send(SessionEvent::Trace(TraceEvent::created(1, "/b"))).await.unwrap();
    drop(tx);

    let (tracker, summary) = with_timeout(Runtime::new(tracker, rx).run()).await;

    assert_eq!(summary.events, 2);
    assert_eq!(summary.failed_events, 1);
    assert!(tracker.is_ignored("/b"));
}
