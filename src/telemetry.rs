//! Structured logging setup.
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber. `RUST_LOG` takes precedence over `filter`.
/// Subsequent calls are no-ops and return `false`.
pub fn init(filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
