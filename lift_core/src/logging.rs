//! Tracing setup shared by the liftweek binary and embedders.
//!
//! Filters come from `LIFTWEEK_LOG`, then `RUST_LOG`, then the level passed
//! in. Output always goes to stderr so it never mixes with command output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Env var checked before `RUST_LOG`
pub const LOG_ENV: &str = "LIFTWEEK_LOG";

/// Warnings only, unless overridden by the environment
pub fn init() {
    init_with_level("warn")
}

/// Install the global subscriber with `default_level` as the fallback filter
///
/// Does nothing if a subscriber is already installed.
pub fn init_with_level(default_level: &str) {
    let _ = tracing_subscriber::registry()
        .with(filter_from_env(default_level))
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn filter_from_env(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Route store and engine logs into the test harness output
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("lift_core=debug"))
        .try_init();
}
