#![allow(dead_code)]

use std::collections::HashMap;

pub use deptrace_test_utils::builders::{ConfigFileBuilder, TrackerBuilder};
pub use deptrace_test_utils::fake_process::FakeProcessInspector;
pub use deptrace_test_utils::init_tracing;

/// Environment table for substitution and expansion tests.
pub fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// MD5 of the empty string.
pub const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";
