//! Error types for foldersync operations

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Object store operation, used to give backend errors context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
	Put,
	Stat,
	List,
	Delete,
}

impl fmt::Display for StoreOp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			StoreOp::Put => "put",
			StoreOp::Stat => "stat",
			StoreOp::List => "list",
			StoreOp::Delete => "delete",
		};
		write!(f, "{}", name)
	}
}

/// Errors surfaced by a store backend
#[derive(Debug)]
pub enum StoreError {
	/// The object does not exist
	NotFound,

	/// Local I/O while feeding or receiving object data
	Io(io::Error),

	/// Transport, permission or protocol failure reported by the backend
	Backend { message: String },

	/// The call observed a tripped cancellation token
	Cancelled,
}

impl fmt::Display for StoreError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StoreError::NotFound => write!(f, "object not found"),
			StoreError::Io(e) => write!(f, "I/O error: {}", e),
			StoreError::Backend { message } => write!(f, "{}", message),
			StoreError::Cancelled => write!(f, "cancelled"),
		}
	}
}

impl Error for StoreError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			StoreError::Io(e) => Some(e),
			_ => None,
		}
	}
}

impl From<io::Error> for StoreError {
	fn from(e: io::Error) -> Self {
		StoreError::Io(e)
	}
}

/// Main error type for sync runs
///
/// Every variant is fatal for the run that produced it.
#[derive(Debug)]
pub enum SyncError {
	/// Source path is missing or not a directory
	InvalidSource { path: PathBuf, reason: String },

	/// Directory traversal failed
	Walk { path: PathBuf, source: io::Error },

	/// Local existence check failed during the mirror phase
	LocalCheck { path: PathBuf, source: io::Error },

	/// A file selected for upload could not be opened
	Open { path: PathBuf, source: io::Error },

	/// Backend call failed
	Store { op: StoreOp, key: Option<String>, source: StoreError },

	/// Invalid configuration
	InvalidConfig { message: String },

	/// Run aborted through the cancellation token
	Cancelled,
}

impl SyncError {
	pub(crate) fn store(op: StoreOp, key: Option<&str>, source: StoreError) -> Self {
		if let StoreError::Cancelled = source {
			return SyncError::Cancelled;
		}
		SyncError::Store { op, key: key.map(str::to_string), source }
	}

	/// Whether the run stopped because it was cancelled
	pub fn is_cancelled(&self) -> bool {
		matches!(self, SyncError::Cancelled)
	}
}

impl fmt::Display for SyncError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SyncError::InvalidSource { path, reason } => {
				write!(f, "source {}: {}", path.display(), reason)
			}
			SyncError::Walk { path, source } => write!(f, "walk {}: {}", path.display(), source),
			SyncError::LocalCheck { path, source } => {
				write!(f, "check {}: {}", path.display(), source)
			}
			SyncError::Open { path, source } => write!(f, "open {}: {}", path.display(), source),
			SyncError::Store { op, key: Some(key), source } => {
				write!(f, "{} {}: {}", op, key, source)
			}
			SyncError::Store { op, key: None, source } => write!(f, "{} objects: {}", op, source),
			SyncError::InvalidConfig { message } => {
				write!(f, "Invalid configuration: {}", message)
			}
			SyncError::Cancelled => write!(f, "Operation cancelled"),
		}
	}
}

impl Error for SyncError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			SyncError::Walk { source, .. }
			| SyncError::LocalCheck { source, .. }
			| SyncError::Open { source, .. } => Some(source),
			SyncError::Store { source, .. } => Some(source),
			_ => None,
		}
	}
}


// vim: ts=4
