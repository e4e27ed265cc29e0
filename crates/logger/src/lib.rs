//! Tracing subscriber setup shared by the binaries.

use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count: 0 → info, 1 → debug, 2+ → trace.
pub fn filter_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise the verbosity decides the level.
/// Calling this twice is harmless, the second call is ignored.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_for_verbosity(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
