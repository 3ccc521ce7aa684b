#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use deptrace::config::{ConfigFile, RawConfigFile};
use deptrace::fs::mock::MockFileSystem;
use deptrace::fs::FileSystem;
use deptrace::rules::{PathMatcher, RegexRule, RuleSet, Rules};
use deptrace::tracker::{Tracker, TrackerOptions};
use deptrace::types::RuleSyntax;

use crate::fake_process::FakeProcessInspector;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn exclude_rules(mut self, path: &str) -> Self {
        self.config.rules.exclude = Some(PathBuf::from(path));
        self
    }

    pub fn kill_rules(mut self, path: &str) -> Self {
        self.config.rules.kill = Some(PathBuf::from(path));
        self
    }

    pub fn syntax(mut self, syntax: RuleSyntax) -> Self {
        self.config.rules.syntax = syntax;
        self
    }

    pub fn tracked_report(mut self, path: &str) -> Self {
        self.config.report.tracked = Some(PathBuf::from(path));
        self
    }

    pub fn ignored_report(mut self, path: &str) -> Self {
        self.config.report.ignored = Some(PathBuf::from(path));
        self
    }

    pub fn substitute(mut self, name: &str) -> Self {
        self.config.report.substitute_env.push(name.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a `Tracker` over a `MockFileSystem` and a
/// `FakeProcessInspector`.
///
/// Keep clones of `fs()` / `processes()` to seed files and inspect kill
/// requests after `build()`.
pub struct TrackerBuilder {
    fs: MockFileSystem,
    processes: FakeProcessInspector,
    syntax: RuleSyntax,
    exclude: Vec<String>,
    kill: Vec<String>,
    extra_exclude: Vec<Box<dyn PathMatcher>>,
    options: TrackerOptions,
}

impl TrackerBuilder {
    pub fn new() -> Self {
        Self {
            fs: MockFileSystem::new(),
            processes: FakeProcessInspector::new(),
            syntax: RuleSyntax::default(),
            exclude: Vec::new(),
            kill: Vec::new(),
            extra_exclude: Vec::new(),
            options: TrackerOptions::default(),
        }
    }

    pub fn with_fs(mut self, fs: MockFileSystem) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_processes(mut self, processes: FakeProcessInspector) -> Self {
        self.processes = processes;
        self
    }

    pub fn syntax(mut self, syntax: RuleSyntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.exclude.push(pattern.to_string());
        self
    }

    pub fn kill(mut self, pattern: &str) -> Self {
        self.kill.push(pattern.to_string());
        self
    }

    /// Append a custom matcher after the compiled exclude patterns.
    pub fn exclude_matcher(mut self, matcher: Box<dyn PathMatcher>) -> Self {
        self.extra_exclude.push(matcher);
        self
    }

    pub fn process_info(mut self, on: bool) -> Self {
        self.options.process_info = on;
        self
    }

    pub fn fs(&self) -> MockFileSystem {
        self.fs.clone()
    }

    pub fn processes(&self) -> FakeProcessInspector {
        self.processes.clone()
    }

    pub fn build(self) -> Tracker {
        let mut exclude: Vec<Box<dyn PathMatcher>> = self
            .exclude
            .iter()
            .map(|p| {
                Box::new(RegexRule::compile(p, self.syntax).expect("invalid exclude pattern in test"))
                    as Box<dyn PathMatcher>
            })
            .collect();
        exclude.extend(self.extra_exclude);

        let kill = RuleSet::from_patterns("kill", &self.kill, self.syntax)
            .expect("invalid kill pattern in test");

        let fs: Arc<dyn FileSystem> = Arc::new(self.fs);
        Tracker::new(
            fs,
            Arc::new(self.processes),
            Rules::new(RuleSet::from_matchers("exclude", exclude), kill),
            self.options,
        )
    }
}

impl Default for TrackerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
