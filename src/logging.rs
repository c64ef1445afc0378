//! Tracing subscriber setup for hosts and tests

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber.
///
/// `RUST_LOG` takes precedence; otherwise verbosity picks the level. Safe to
/// call more than once: later calls are ignored.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_for(verbosity));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn filter_for(verbosity: u8) -> EnvFilter {
    match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info,ignore=warn,globset=warn"),
        2 => EnvFilter::new("debug,ignore=warn,globset=warn"),
        _ => EnvFilter::new("trace"), // includes walker internals
    }
}
