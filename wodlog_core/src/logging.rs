//! Tracing setup for the `wodlog` binary and the core's tests.
//!
//! Engine decisions (state changes, saves, fallbacks to freeform text) are
//! emitted as `tracing` events; this module decides where they go.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Route events to stderr at INFO, or whatever `RUST_LOG` asks for
pub fn init() {
    init_with_level("info")
}

/// Route events to stderr with `default_level` unless `RUST_LOG` is set
///
/// `wodlog --verbose` passes `"debug"` to see state transitions and score
/// fallbacks. Results and tables stay on stdout.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Show engine debug events in `cargo test` output; safe to call per test
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
