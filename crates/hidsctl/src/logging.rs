//! Diagnostic logging for hidsctl
//!
//! Diagnostics go to stderr so stdout carries only operator output.
//! Filter comes from `$HIDS_LOG` (e.g. `HIDS_LOG=debug`), default `warn`.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "HIDS_LOG";

pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second init (e.g. from tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
