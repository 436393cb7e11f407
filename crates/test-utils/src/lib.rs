//! Shared helpers for `seqrun` integration tests.
//!
//! - [`builders`]: in-memory plan construction.
//! - [`steps`]: recording, gated and failing steps.
//! - [`recorder`]: event logs attached to sequences and schedulers.

pub mod builders;
pub mod recorder;
pub mod steps;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Upper bound for any single awaited condition in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a per-test tracing subscriber once per test binary.
///
/// Output is captured by the harness and shown for failing tests only.
/// Filter with `RUST_LOG`, e.g. `RUST_LOG=seqrun=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `f`, panicking after [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("test timed out after {TEST_TIMEOUT:?}"))
}

/// Give spawned tasks a chance to run; long enough for any immediately
/// ready step chain to settle.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}
