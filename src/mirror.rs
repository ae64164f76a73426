//! Mirror phase: delete stored objects that no longer exist locally

use std::io;
use std::path::Path;

use crate::callbacks::SyncEvent;
use crate::error::{StoreError, StoreOp, SyncError};
use crate::keys;
use crate::logging::*;
use crate::sync::{RunContext, SyncReport};
use crate::types::{Action, ActionOutcome};

/// Local counterpart of a stored key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStatus {
	/// Something exists at the key's local path
	Present,
	/// Nothing exists locally; the object should be removed
	DeleteCandidate,
}

fn is_absent(e: &io::Error) -> bool {
	matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory)
}

/// Check whether `key` still has a local counterpart under `root`.
///
/// Keys that cannot name a path inside `root` are delete candidates without
/// touching the filesystem.
pub async fn local_status(root: &Path, key: &str) -> Result<RemoteStatus, SyncError> {
	let path = match keys::key_to_path(root, key) {
		Some(path) => path,
		None => {
			warn!("[mirror] key {:?} escapes the source tree", key);
			return Ok(RemoteStatus::DeleteCandidate);
		}
	};

	match tokio::fs::metadata(&path).await {
		Ok(_) => Ok(RemoteStatus::Present),
		Err(e) if is_absent(&e) => Ok(RemoteStatus::DeleteCandidate),
		Err(source) => Err(SyncError::LocalCheck { path, source }),
	}
}

/// List the store and delete every key without a local counterpart.
pub(crate) async fn mirror_phase(ctx: &RunContext<'_>, report: &mut SyncReport) -> Result<(), SyncError> {
	ctx.check_cancelled()?;
	let remote_keys =
		ctx.store.list(ctx.cancel).await.map_err(|e| SyncError::store(StoreOp::List, None, e))?;
	report.remote_keys = remote_keys.len();
	debug!("[mirror] {} keys in store", remote_keys.len());

	for key in remote_keys {
		ctx.check_cancelled()?;
		if local_status(&ctx.options.source, &key).await? == RemoteStatus::Present {
			continue;
		}

		let action = Action::delete(key);
		ctx.emit(SyncEvent::Action(action.clone()));
		if ctx.options.dry_run {
			report.record(action, ActionOutcome::DryRun);
			continue;
		}

		ctx.check_cancelled()?;
		match ctx.store.delete(&action.key, ctx.cancel).await {
			Ok(()) => {}
			Err(StoreError::NotFound) => debug!("[mirror] {} already gone", action.key),
			Err(e) => return Err(SyncError::store(StoreOp::Delete, Some(&action.key), e)),
		}
		report.record(action, ActionOutcome::Applied);
	}
	Ok(())
}


// vim: ts=4
