//! `tracing` subscriber setup.

use tracing_subscriber::{prelude::*, EnvFilter};

/// Build the filter: `RUST_LOG` wins when set, then `level`, then `info`.
pub fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a stderr fmt subscriber. Returns false if one was already set.
pub fn init(level: &str) -> bool {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    tracing_subscriber::registry()
        .with(filter_for(level))
        .with(fmt_layer)
        .try_init()
        .is_ok()
}
