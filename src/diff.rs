//! Upload phase: compare every local file with its stored object
//!
//! A file is up to date iff an object exists under its key with the same
//! byte size and the same modification time in whole seconds. Anything else
//! is uploaded.

use tokio::fs::File;

use crate::callbacks::SyncEvent;
use crate::error::{StoreOp, SyncError};
use crate::keys;
use crate::logging::*;
use crate::store::ObjectMeta;
use crate::sync::{RunContext, SyncReport};
use crate::types::{Action, ActionOutcome};
use crate::walk::{LocalFile, Walk};

/// Classification of a local file against the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
	/// Stored object matches size and mtime
	UpToDate,
	/// No object under the key
	Missing,
	/// Object exists but size or mtime differ
	Stale,
}

impl FileStatus {
	pub fn needs_upload(self) -> bool {
		self != FileStatus::UpToDate
	}
}

/// Classify `file` against the stored metadata for its key.
///
/// Size and mtime are checked independently; a matching mtime never excuses
/// a size difference. Both mtimes are already whole seconds.
pub fn classify(file: &LocalFile, remote: Option<&ObjectMeta>) -> FileStatus {
	match remote {
		None => FileStatus::Missing,
		Some(meta) if meta.size == file.size && meta.mtime == Some(file.mtime) => {
			FileStatus::UpToDate
		}
		Some(_) => FileStatus::Stale,
	}
}

/// Walk the source tree and upload every file that is missing or stale.
pub(crate) async fn upload_phase(ctx: &RunContext<'_>, report: &mut SyncReport) -> Result<(), SyncError> {
	for entry in Walk::new(&ctx.options.source) {
		ctx.check_cancelled()?;
		let file = entry?;
		let key = keys::path_to_key(&file.relative);
		report.files_scanned += 1;

		let remote = ctx
			.store
			.stat(&key, ctx.cancel)
			.await
			.map_err(|e| SyncError::store(StoreOp::Stat, Some(&key), e))?;

		let status = classify(&file, remote.as_ref());
		if !status.needs_upload() {
			debug!("[diff] {} is up to date", key);
			report.files_up_to_date += 1;
			ctx.emit(SyncEvent::UpToDate { key });
			continue;
		}
		debug!("[diff] {} is {:?}", key, status);

		let action = Action::upload(key);
		ctx.emit(SyncEvent::Action(action.clone()));
		if ctx.options.dry_run {
			report.record(action, ActionOutcome::DryRun);
			continue;
		}

		ctx.check_cancelled()?;
		let body = File::open(&file.path)
			.await
			.map_err(|source| SyncError::Open { path: file.path.clone(), source })?;
		ctx.store
			.put(&action.key, body, file.size, file.mtime, ctx.cancel)
			.await
			.map_err(|e| SyncError::store(StoreOp::Put, Some(&action.key), e))?;

		report.bytes_uploaded += file.size;
		report.record(action, ActionOutcome::Applied);
	}
	Ok(())
}


// vim: ts=4
