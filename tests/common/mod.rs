//! Shared helpers for spillway integration tests.

#![allow(dead_code)]

use spillway::{Publisher, Subscriber};
use std::time::Duration;

/// How long a test waits for something that should happen promptly.
pub const PROMPT: Duration = Duration::from_secs(2);

/// How long a test waits to be reasonably sure something does not happen.
pub const QUIET: Duration = Duration::from_millis(50);

pub type Bus = Publisher<&'static str, String>;
pub type Sub = Subscriber<&'static str, String>;

/// Create a publisher with error-only test logging.
pub fn bus() -> Bus {
    spillway::observability::tracing::init_test_tracing();
    Publisher::new()
}

/// Receive the next topic, failing the test if none arrives promptly.
pub async fn recv_prompt(sub: &mut Sub) -> Option<String> {
    tokio::time::timeout(PROMPT, sub.recv())
        .await
        .expect("subscriber did not yield in time")
}

/// Assert that no topic arrives within [`QUIET`].
pub async fn assert_quiet(sub: &mut Sub) {
    if let Ok(topic) = tokio::time::timeout(QUIET, sub.recv()).await {
        panic!("unexpected topic: {topic:?}");
    }
}

/// Wait for a condition to become true with timeout.
///
/// # Returns
///
/// `true` if condition was met, `false` if timeout expired
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
