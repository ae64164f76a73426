//! Logging prelude module for convenient access to tracing macros.
//!
//! # Usage
//!
//! ```ignore
//! use crate::logging::*;
//!
//! info!("upload phase finished");
//! debug!("[diff] {} is up to date", key);
//! ```

pub use tracing::{debug, error, info, warn};

/// Initialize the tracing subscriber with environment filter support.
///
/// `RUST_LOG` takes precedence; otherwise `default_level` (for example the
/// configured `logLevel`) is used. Logs go to stderr so that stdout only
/// carries action lines:
///
/// ```bash
/// RUST_LOG=debug foldersync --src ./photos --bucket archive
/// RUST_LOG=foldersync::store=debug foldersync --src ./photos --bucket archive
/// ```
pub fn init_tracing(default_level: &str) {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
		)
		.with_writer(std::io::stderr)
		.init();
}
