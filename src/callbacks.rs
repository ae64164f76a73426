//! Callback traits for progress reporting and event handling

use std::io::{self, Write};

use crate::types::{Action, Phase};

/// Events emitted during a sync run, in the order they happen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
	/// Phase lifecycle: `is_starting` is true on entry, false on completion
	PhaseChanged { phase: Phase, is_starting: bool },

	/// An action was decided; emitted before its side effect, if any
	Action(Action),

	/// A local file matched the stored object and was skipped
	UpToDate { key: String },
}

/// Receives sync events
pub trait SyncCallbacks: Send + Sync {
	fn on_event(&self, _event: &SyncEvent) {}
}

impl<T: Fn(&SyncEvent) + Send + Sync> SyncCallbacks for T {
	fn on_event(&self, event: &SyncEvent) {
		self(event);
	}
}

/// Callbacks that ignore every event
pub struct NoCallbacks;

impl SyncCallbacks for NoCallbacks {}

/// Prints one `upload <key>` / `delete <key>` line per action to stdout
pub struct PrintActions;

impl SyncCallbacks for PrintActions {
	fn on_event(&self, event: &SyncEvent) {
		if let SyncEvent::Action(action) = event {
			let stdout = io::stdout();
			let mut out = stdout.lock();
			let _ = writeln!(out, "{}", action);
			let _ = out.flush();
		}
	}
}


// vim: ts=4
