use deptrace::logging::{crate_filter, filter_from_spec};
use tracing::Level;

#[test]
fn test_level_applies_to_deptrace_only() {
    let filter = crate_filter(Level::DEBUG).to_string();
    assert!(filter.contains("deptrace=debug"), "{filter}");
    assert!(filter.contains("warn"), "{filter}");
}

#[test]
fn test_env_value_forms() {
    let bare = filter_from_spec(" Trace ").unwrap().to_string();
    assert!(bare.contains("deptrace=trace"), "{bare}");

    let directives = filter_from_spec("deptrace::tracker=trace,deptrace=info")
        .unwrap()
        .to_string();
    assert!(directives.contains("deptrace::tracker=trace"), "{directives}");

    assert!(filter_from_spec("deptrace=loud").is_err());
}
