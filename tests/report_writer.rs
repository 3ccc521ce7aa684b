mod common;

use std::path::Path;

use deptrace::check::{check, check_report};
use deptrace::errors::DeptraceError;
use deptrace::process::ProcessInfo;
use deptrace::report::{
    expand_path, format_tracked_record, hash_file, write_reports, ContentDigest, ReportOptions,
    ReportSummary, ReportTargets, Substitutions,
};
use deptrace::types::Verdict;

use common::{init_tracing, vars, FakeProcessInspector, TrackerBuilder, EMPTY_MD5};

#[test]
fn test_md5_of_known_content() {
    assert_eq!(ContentDigest::of_bytes(b"").to_hex(), EMPTY_MD5);
    assert_eq!(
        ContentDigest::of_bytes(b"hello world").to_hex(),
        "5eb63bbbe01eeed093cb22bb8f5acdc3"
    );
}

#[test]
fn test_hex_digest_parsing_is_strict() {
    assert!(ContentDigest::from_hex(EMPTY_MD5).is_ok());
    assert!(ContentDigest::from_hex("D41D8CD98F00B204E9800998ECF8427E").is_ok());
    assert!(ContentDigest::from_hex("d41d8cd9").is_err());
    assert!(ContentDigest::from_hex("zz1d8cd98f00b204e9800998ecf8427e").is_err());
}

#[test]
fn test_permission_denied_hash_is_no_digest() {
    let fs = deptrace::fs::mock::MockFileSystem::new();
    fs.add_file("/root/secret", b"s".to_vec());
    fs.deny_read("/root/secret");

    assert_eq!(hash_file(&fs, Path::new("/root/secret")).unwrap(), None);
    assert!(matches!(
        hash_file(&fs, Path::new("/root/missing")),
        Err(DeptraceError::IoError { .. })
    ));
}

#[test]
fn test_record_format_columns() {
    let digest = ContentDigest::of_bytes(b"");
    let info = ProcessInfo::new(42, b"build".to_vec());

    assert_eq!(
        format_tracked_record(Some(&digest), "/etc/conf", Some(&info)),
        format!("{EMPTY_MD5}\t/etc/conf\tbuild (42)")
    );
    assert_eq!(format_tracked_record(None, "/etc/conf", None), "/etc/conf");
}

#[test]
fn test_command_line_is_flattened_into_one_column() {
    let info = ProcessInfo::new(7, b"sh\0-c\0echo a\tb\nc\0".to_vec());
    assert_eq!(info.render(), "sh -c echo a b c (7)");
}

#[test]
fn test_round_trip_with_checksum_and_process_info() {
    init_tracing();
    let processes = FakeProcessInspector::new().with_command_line(42, &["build"]);
    let builder = TrackerBuilder::new().with_processes(processes).process_info(true);
    let fs = builder.fs();
    fs.add_file("/etc/conf", Vec::new());
    let mut tracker = builder.build();
    tracker.admit_opened("/etc/conf", 42).unwrap();

    let options = ReportOptions {
        checksum: true,
        process_info: true,
        ..ReportOptions::default()
    };
    let targets = ReportTargets {
        tracked: Some(Path::new("/out/deps")),
        ignored: None,
    };
    let summary = write_reports(&tracker, &options, &Substitutions::none(), &targets).unwrap();
    assert_eq!(summary.tracked_records, 1);

    assert_eq!(
        fs.read_string("/out/deps").unwrap(),
        format!("{EMPTY_MD5}\t/etc/conf\tbuild (42)\n")
    );

    let verdict = check(&fs, Some(Path::new("/out/deps")), &vars(&[]), false);
    assert_eq!(verdict, Verdict::NoChangesFound);
}

#[test]
fn test_reports_are_sorted_and_substituted() {
    let builder = TrackerBuilder::new().exclude("\\.o$");
    let fs = builder.fs();
    for path in ["/home/u/src/b.c", "/home/u/src/a.c", "/usr/include/stdio.h", "/home/u/src/a.o"] {
        fs.add_file(path, path.as_bytes().to_vec());
    }
    let mut tracker = builder.build();
    for path in ["/home/u/src/b.c", "/home/u/src/a.o", "/usr/include/stdio.h", "/home/u/src/a.c"] {
        tracker.admit_opened(path, 1).unwrap();
    }

    let env = vars(&[("HOME", "/home/u")]);
    let subs = Substitutions::resolve(&["HOME"], &env).unwrap();
    let options = ReportOptions {
        checksum: false,
        ..ReportOptions::default()
    };
    let targets = ReportTargets {
        tracked: Some(Path::new("/out/deps")),
        ignored: Some(Path::new("/out/ignored")),
    };
    let summary = write_reports(&tracker, &options, &subs, &targets).unwrap();

    assert_eq!(
        summary,
        ReportSummary {
            tracked_records: 3,
            ignored_records: 1,
            skipped: 0,
            vanished: 0,
        }
    );
    assert_eq!(
        fs.read_string("/out/deps").unwrap(),
        "$HOME/src/a.c\n$HOME/src/b.c\n/usr/include/stdio.h\n"
    );
    assert_eq!(fs.read_string("/out/ignored").unwrap(), "$HOME/src/a.o\n");
}

#[test]
fn test_omitted_destination_writes_nothing() {
    let builder = TrackerBuilder::new();
    let fs = builder.fs();
    fs.add_file("/a", Vec::new());
    let mut tracker = builder.build();
    tracker.admit_opened("/a", 1).unwrap();

    let targets = ReportTargets {
        tracked: None,
        ignored: Some(Path::new("/out/ignored")),
    };
    write_reports(&tracker, &ReportOptions::default(), &Substitutions::none(), &targets).unwrap();

    assert_eq!(fs.read_string("/out/ignored").unwrap(), "");
    assert!(fs.read_string("/out/deps").is_none());
}

#[test]
fn test_unreadable_tracked_file_is_left_out() {
    let builder = TrackerBuilder::new();
    let fs = builder.fs();
    fs.add_file("/a", Vec::new());
    fs.add_file("/b", Vec::new());
    let mut tracker = builder.build();
    tracker.admit_opened("/a", 1).unwrap();
    tracker.admit_opened("/b", 1).unwrap();
    fs.deny_read("/a");

    let targets = ReportTargets {
        tracked: Some(Path::new("/deps")),
        ignored: None,
    };
    let summary =
        write_reports(&tracker, &ReportOptions::default(), &Substitutions::none(), &targets)
            .unwrap();

    assert_eq!(summary.tracked_records, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(fs.read_string("/deps").unwrap(), format!("{EMPTY_MD5}\t/b\n"));
}

#[test]
fn test_vanished_tracked_file_is_still_recorded() {
    init_tracing();
    let builder = TrackerBuilder::new().exclude("^/tmp/");
    let fs = builder.fs();
    fs.add_file("/a", b"a".to_vec());
    fs.add_file("/b", b"b".to_vec());
    fs.add_file("/tmp/x", Vec::new());
    let mut tracker = builder.build();
    for path in ["/a", "/b", "/tmp/x"] {
        tracker.admit_opened(path, 1).unwrap();
    }
    fs.remove("/b");

    let targets = ReportTargets {
        tracked: Some(Path::new("/deps")),
        ignored: Some(Path::new("/ignored")),
    };
    let summary =
        write_reports(&tracker, &ReportOptions::default(), &Substitutions::none(), &targets)
            .unwrap();

    assert_eq!(summary.tracked_records, 2);
    assert_eq!(summary.vanished, 1);
    assert_eq!(
        fs.read_string("/deps").unwrap(),
        format!(
            "0cc175b9c0f1b6a831c399e269772661\t/a\n{}\t/b\n",
            ContentDigest::VANISHED.to_hex()
        )
    );
    assert_eq!(fs.read_string("/ignored").unwrap(), "/tmp/x\n");

    // Still missing: a change.
    assert_eq!(check(&fs, Some(Path::new("/deps")), &vars(&[]), false), Verdict::ChangesFound);
    // Back with any content: still a change.
    fs.add_file("/b", b"edited".to_vec());
    assert_eq!(check(&fs, Some(Path::new("/deps")), &vars(&[]), false), Verdict::ChangesFound);
}

#[test]
fn test_failed_dump_leaves_no_report_behind() {
    let builder = TrackerBuilder::new();
    let fs = builder.fs();
    fs.add_file("/a", Vec::new());
    fs.add_file("/b", Vec::new());
    let mut tracker = builder.build();
    tracker.admit_opened("/a", 1).unwrap();
    tracker.admit_opened("/b", 1).unwrap();

    // A report from an earlier run that still matches the disk.
    fs.add_file("/deps", format!("{EMPTY_MD5}\t/a\n"));
    // Hashing /b now fails with something other than "missing".
    fs.remove("/b");
    fs.add_dir("/b");

    let targets = ReportTargets {
        tracked: Some(Path::new("/deps")),
        ignored: None,
    };
    let err = write_reports(&tracker, &ReportOptions::default(), &Substitutions::none(), &targets)
        .unwrap_err();

    assert!(matches!(err, DeptraceError::IoError { .. }));
    assert!(fs.read_string("/deps").is_none());
    assert!(fs.read_string("/deps.partial").is_none());
    assert_eq!(check(&fs, Some(Path::new("/deps")), &vars(&[]), false), Verdict::ChangesFound);
}

#[test]
fn test_rewrite_replaces_previous_report() {
    let builder = TrackerBuilder::new();
    let fs = builder.fs();
    fs.add_file("/a", Vec::new());
    fs.add_file("/deps", "stale\n");
    let mut tracker = builder.build();
    tracker.admit_opened("/a", 1).unwrap();

    let targets = ReportTargets {
        tracked: Some(Path::new("/deps")),
        ignored: None,
    };
    write_reports(&tracker, &ReportOptions::default(), &Substitutions::none(), &targets).unwrap();

    assert_eq!(fs.read_string("/deps").unwrap(), format!("{EMPTY_MD5}\t/a\n"));
    assert!(fs.read_string("/deps.partial").is_none());
}

#[test]
fn test_late_ignored_filtering() {
    let builder = TrackerBuilder::new();
    let fs = builder.fs();
    fs.add_file("/gen.h", Vec::new());
    fs.add_file("/real.h", Vec::new());
    let mut tracker = builder.build();
    tracker.admit_opened("/gen.h", 1).unwrap();
    tracker.admit_opened("/real.h", 1).unwrap();
    tracker.notify_created("/gen.h").unwrap();

    let targets = ReportTargets {
        tracked: Some(Path::new("/deps")),
        ignored: None,
    };

    let keep = ReportOptions {
        checksum: false,
        warn_tracked_ignored: true,
        ..ReportOptions::default()
    };
    write_reports(&tracker, &keep, &Substitutions::none(), &targets).unwrap();
    assert_eq!(fs.read_string("/deps").unwrap(), "/gen.h\n/real.h\n");

    let filtered = ReportOptions {
        checksum: false,
        exclude_tracked_ignored: true,
        ..ReportOptions::default()
    };
    let summary = write_reports(&tracker, &filtered, &Substitutions::none(), &targets).unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(fs.read_string("/deps").unwrap(), "/real.h\n");
}

#[test]
fn test_substitution_inverse() {
    let env = vars(&[("HOME", "/home/u")]);
    let subs = Substitutions::resolve(&["HOME"], &env).unwrap();

    let rendered = subs.render_path("/home/u/x");
    assert_eq!(rendered, "$HOME/x");
    assert_eq!(expand_path(&rendered, &env).unwrap(), "/home/u/x");
}

#[test]
fn test_substitution_only_on_segment_boundary_and_first_wins() {
    let env = vars(&[("HOME", "/home/u"), ("SRC", "/home/u/src"), ("EMPTY", "")]);
    let subs = Substitutions::resolve(&["EMPTY", "SRC", "HOME"], &env).unwrap();

    assert_eq!(subs.render_path("/home/u/src/a.c"), "$SRC/a.c");
    assert_eq!(subs.render_path("/home/u/doc"), "$HOME/doc");
    assert_eq!(subs.render_path("/home/user/doc"), "/home/user/doc");
    assert_eq!(subs.render_path("/etc/hosts"), "/etc/hosts");
}

#[test]
fn test_unset_substitution_variable_is_env_error() {
    let env = vars(&[]);
    match Substitutions::resolve(&["BUILD_ROOT"], &env) {
        Err(DeptraceError::EnvError(name)) => assert_eq!(name, "BUILD_ROOT"),
        other => panic!("Expected EnvError, got: {:?}", other),
    }
    assert!(matches!(
        expand_path("$BUILD_ROOT/x", &env),
        Err(DeptraceError::EnvError(_))
    ));
}

#[test]
fn test_literal_dollar_in_path_survives_the_report() {
    let env = vars(&[("HOME", "/home/u")]);
    let subs = Substitutions::resolve(&["HOME"], &env).unwrap();

    assert_eq!(subs.render_path("/src/a$b.c"), "/src/a$$b.c");
    assert_eq!(subs.render_path("/home/u/$x"), "$HOME/$$x");
    assert_eq!(expand_path("/src/a$$b.c", &env).unwrap(), "/src/a$b.c");
    assert_eq!(expand_path("$HOME/$$x", &env).unwrap(), "/home/u/$x");

    let builder = TrackerBuilder::new();
    let fs = builder.fs();
    fs.add_file("/src/a$b.c", Vec::new());
    fs.add_file("/home/u/$x", Vec::new());
    let mut tracker = builder.build();
    tracker.admit_opened("/src/a$b.c", 1).unwrap();
    tracker.admit_opened("/home/u/$x", 1).unwrap();

    let targets = ReportTargets {
        tracked: Some(Path::new("/deps")),
        ignored: None,
    };
    write_reports(&tracker, &ReportOptions::default(), &subs, &targets).unwrap();
    assert_eq!(check(&fs, Some(Path::new("/deps")), &env, false), Verdict::NoChangesFound);

    fs.add_file("/src/a$b.c", b"edited".to_vec());
    assert_eq!(check(&fs, Some(Path::new("/deps")), &env, false), Verdict::ChangesFound);
}

#[test]
fn test_multiple_placeholders_expand() {
    let env = vars(&[("A", "/a"), ("B", "b")]);
    assert_eq!(expand_path("$A/$B/c", &env).unwrap(), "/a/b/c");
    assert_eq!(expand_path("/plain/path", &env).unwrap(), "/plain/path");
}

#[test]
fn test_check_report_lists_changed_records() {
    let fs = deptrace::fs::mock::MockFileSystem::new();
    fs.add_file("/a", Vec::new());
    fs.add_file("/b", b"changed".to_vec());
    fs.add_file(
        "/deps",
        format!("{EMPTY_MD5}\t/a\n{EMPTY_MD5}\t/b\n"),
    );

    let report = check_report(&fs, Path::new("/deps"), &vars(&[]), false).unwrap();
    assert_eq!(report.records, 2);
    assert_eq!(report.changed, vec![Path::new("/b").to_path_buf()]);
    assert_eq!(report.verdict(), Verdict::ChangesFound);
}
