//! Tracing subscriber bootstrap shared by both binaries.
//!
//! `RUST_LOG` wins when set; otherwise the configured directive is used.

use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
