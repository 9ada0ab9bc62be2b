//! Structured logging with `tracing`.
//!
//! - [`init_subscriber`] installs the process-wide stderr subscriber
//! - `test_utils` (tests and the `test-util` feature) captures events in
//!   memory for assertions
//!
//! `Client::run` installs the stderr subscriber at the configured level unless
//! the embedder handed a [`tracing::Dispatch`] to the client builder.

#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;

#[cfg(any(test, feature = "test-util"))]
pub use test_utils::{CapturedLogs, capture_dispatch, capture_logs};

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber with stderr output.
///
/// `RUST_LOG` wins over `level` when set. Returns `false` if a global
/// subscriber was already installed, in which case nothing changes.
///
/// # Arguments
///
/// * `level` - Minimum log level to display, e.g. `"warn"`.
pub fn init_subscriber(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    subscriber.try_init().is_ok()
}

/// Filter for a configured level such as `"debug"` or `"deckplug=trace"`.
pub fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::new(level)
}
