// SPDX-License-Identifier: MIT

use tracing_subscriber::{fmt, EnvFilter};

/// Install a `tracing` subscriber with `config.log_level` as the default
/// filter. `RUST_LOG`, if set, still takes precedence, matching
/// `tracing_subscriber::EnvFilter`'s usual behavior.
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(true).init();
}
