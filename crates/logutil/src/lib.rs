//! Utilities for logging.

use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Env var read for log directives.
pub const LOG_ENV_VAR: &str = "RUST_LOG";

/// Build a filter from `RUST_LOG`, falling back to `default` for anything
/// not covered by a directive.
pub fn env_filter(default: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy()
}

/// Install a global subscriber writing to stderr.
///
/// Does nothing if a global subscriber is already set.
pub fn init() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter(Level::WARN))
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Install a global subscriber writing through the test harness so output is
/// captured per test.
///
/// Safe to call from every test.
pub fn init_test() {
    let subscriber = FmtSubscriber::builder()
        .with_test_writer()
        .with_env_filter(env_filter(Level::DEBUG))
        .with_file(true)
        .with_line_number(true)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
