//! Logging setup: `tracing` + `tracing-subscriber` with an env filter
//! and timestamps. This core has one process role and one log
//! destination, so it keeps to the plain `EnvFilter`/`fmt::layer`
//! skeleton rather than a custom formatter or a file-backed layer.

use std::sync::Once;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

static INIT_LOG: Once = Once::new();

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber once per process. Safe to call more
/// than once; subsequent calls are no-ops.
pub fn setup_logging() {
    INIT_LOG.call_once(|| {
        let stdout_layer = tracing_subscriber::fmt::layer().with_target(true).with_timer(tracing_subscriber::fmt::time::SystemTime);

        tracing_subscriber::registry().with(default_filter()).with(stdout_layer).init();
    });
}
