//! Logging setup shared by every binary.

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `$RUST_LOG`, which defaults to
/// `info` when unset or invalid.
pub fn init_logging() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();
}
