//! Signal handlers for graceful termination
//!
//! The first SIGINT/SIGTERM trips the cancellation token so the run stops
//! between file operations. A second signal exits immediately.

use tokio_util::sync::CancellationToken;

use crate::logging::*;

/// Exit status used for an interrupted run (128 + SIGINT)
pub const EXIT_INTERRUPTED: u8 = 130;

#[cfg(unix)]
async fn wait_for_signal() -> bool {
	use tokio::signal::unix::{signal, SignalKind};

	let mut sigterm = match signal(SignalKind::terminate()) {
		Ok(stream) => stream,
		Err(e) => {
			warn!("Failed to setup SIGTERM handler: {}. Process will not handle SIGTERM gracefully.", e);
			return tokio::signal::ctrl_c().await.is_ok();
		}
	};

	tokio::select! {
		_ = sigterm.recv() => {
			debug!("Received SIGTERM");
			true
		}
		res = tokio::signal::ctrl_c() => {
			debug!("Received SIGINT");
			res.is_ok()
		}
	}
}

#[cfg(not(unix))]
async fn wait_for_signal() -> bool {
	tokio::signal::ctrl_c().await.is_ok()
}

/// Spawn a task that cancels `cancel` on the first termination signal.
pub fn setup_signal_handlers(cancel: CancellationToken) {
	tokio::spawn(async move {
		if !wait_for_signal().await {
			warn!("Failed to listen for termination signals");
			return;
		}
		warn!("Interrupted, stopping after the current operation (press Ctrl-C again to abort)");
		cancel.cancel();

		if wait_for_signal().await {
			std::process::exit(EXIT_INTERRUPTED as i32);
		}
	});
}

// vim: ts=4
