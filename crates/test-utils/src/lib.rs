pub mod builders;
pub mod fake_process;

use std::sync::Once;
use std::time::Duration;

use deptrace::logging::{crate_filter, filter_from_spec, LOG_ENV};
use tracing_subscriber::fmt;

static INIT: Once = Once::new();

/// Install a per-test log subscriber once.
///
/// Output is captured by the test harness and only shown for failing tests.
/// Takes the same `DEPTRACE_LOG` values as the binary, defaulting to
/// `deptrace=debug`, e.g. `DEPTRACE_LOG=deptrace::tracker=trace`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = std::env::var(LOG_ENV)
            .ok()
            .and_then(|spec| filter_from_spec(&spec).ok())
            .unwrap_or_else(|| crate_filter(tracing::Level::DEBUG));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, panicking if it takes longer than five seconds.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("session did not finish within 5 seconds")
}
