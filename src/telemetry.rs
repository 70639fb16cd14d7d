//! Diagnostic logging.
//!
//! Events go to stderr through a `tracing-subscriber` fmt layer. `MM_LOG`
//! takes an `EnvFilter` directive and wins over `--verbose`.

use std::io;

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "MM_LOG";

/// Install the global subscriber. Call once, before any work.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "mm=warn",
        1 => "mm=info",
        _ => "mm=debug",
    }
}
