//! Fakes and builders shared by the `execbatch` integration tests.

pub mod builders;
pub mod recording_observer;
pub mod scripted_backend;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Upper bound for a single test body.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a per-test tracing subscriber once per test binary.
///
/// Output goes through the test writer, so it only shows up for failing
/// tests. `RUST_LOG=execbatch=debug cargo test` turns on engine logs.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("execbatch=info"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `f`, failing the test if it takes longer than [`TEST_TIMEOUT`].
///
/// Under a paused clock this is measured in virtual time.
pub async fn with_timeout<F>(f: F) -> F::Output
where
    F: Future,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(out) => out,
        Err(_) => panic!("test did not finish within {TEST_TIMEOUT:?}"),
    }
}
