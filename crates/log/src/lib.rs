//! Tracing subscriber initialization.
//!
//! Every binary in this workspace calls [`init`] once at startup. Tests that
//! want to observe log output should call [`init_for_test`] instead, which
//! tolerates being called more than once across a test binary.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format for the root subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable, ANSI-colored lines. Default for local development.
    #[default]
    Pretty,
    /// Newline-delimited JSON, one object per event. Used in production.
    Json,
}

/// Initialize the global tracing subscriber.
///
/// Reads the filter directive from `RUST_LOG`, falling back to `info` when
/// unset or invalid. Panics if a global subscriber is already installed —
/// call this exactly once, at process startup.
pub fn init(format: Format) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        Format::Pretty => registry.with(fmt::layer().with_target(true)).init(),
        Format::Json => registry.with(fmt::layer().json().with_target(true)).init(),
    }
}

/// Initialize a subscriber for tests, ignoring the "already set" error.
///
/// Test binaries run many tests in one process; only the first call wins.
pub fn init_for_test() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_test_writer())
        .try_init();
}
