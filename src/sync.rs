//! Sync orchestration
//!
//! A run is strictly sequential: validate the source, run the upload phase,
//! then (if mirroring) the mirror phase. The first error ends the run;
//! actions already applied stay applied and a re-run finishes the work.
//!
//! ```rust,ignore
//! use foldersync::store::{S3Store, S3StoreConfig};
//! use foldersync::sync::SyncBuilder;
//! use std::sync::Arc;
//!
//! let store = Arc::new(S3Store::new(S3StoreConfig::new("archive")).await);
//! let report = SyncBuilder::new()
//!     .source("./photos")
//!     .mirror(true)
//!     .run(store)
//!     .await?;
//! println!("{} actions", report.actions.len());
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::callbacks::{NoCallbacks, SyncCallbacks, SyncEvent};
use crate::diff;
use crate::error::SyncError;
use crate::logging::*;
use crate::mirror;
use crate::store::Store;
use crate::types::{Action, ActionKind, ActionOutcome, ActionRecord, Phase};

/// Per-run settings, fixed for the lifetime of a [`Syncer`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
	/// Local directory to synchronize
	pub source: PathBuf,
	/// Decide and report actions without performing any put or delete
	pub dry_run: bool,
	/// Delete stored objects that have no local counterpart
	pub mirror: bool,
}

/// Outcome of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
	/// Actions in the order they were decided
	pub actions: Vec<ActionRecord>,
	/// Regular files visited by the upload phase
	pub files_scanned: usize,
	/// Files skipped because the stored object matched
	pub files_up_to_date: usize,
	/// Bytes sent by applied uploads
	pub bytes_uploaded: u64,
	/// Keys listed by the mirror phase
	pub remote_keys: usize,
}

impl SyncReport {
	pub(crate) fn record(&mut self, action: Action, outcome: ActionOutcome) {
		self.actions.push(ActionRecord { action, outcome });
	}

	/// Decided actions without their outcomes
	pub fn planned(&self) -> Vec<Action> {
		self.actions.iter().map(|r| r.action.clone()).collect()
	}

	fn keys_of(&self, kind: ActionKind) -> Vec<&str> {
		self.actions
			.iter()
			.filter(|r| r.action.kind == kind)
			.map(|r| r.action.key.as_str())
			.collect()
	}

	pub fn uploads(&self) -> Vec<&str> {
		self.keys_of(ActionKind::Upload)
	}

	pub fn deletes(&self) -> Vec<&str> {
		self.keys_of(ActionKind::Delete)
	}

	/// Number of actions whose side effect was performed
	pub fn applied(&self) -> usize {
		self.actions.iter().filter(|r| r.outcome == ActionOutcome::Applied).count()
	}
}

/// Borrowed state shared by the phases of one run
pub(crate) struct RunContext<'a> {
	pub store: &'a dyn Store,
	pub options: &'a SyncOptions,
	pub callbacks: &'a dyn SyncCallbacks,
	pub cancel: &'a CancellationToken,
}

impl RunContext<'_> {
	pub fn check_cancelled(&self) -> Result<(), SyncError> {
		if self.cancel.is_cancelled() {
			return Err(SyncError::Cancelled);
		}
		Ok(())
	}

	pub fn emit(&self, event: SyncEvent) {
		self.callbacks.on_event(&event);
	}

	fn phase(&self, phase: Phase, is_starting: bool) {
		self.emit(SyncEvent::PhaseChanged { phase, is_starting });
	}
}

/// Check that `options.source` exists and is a directory.
pub async fn validate_source(options: &SyncOptions) -> Result<(), SyncError> {
	let path = &options.source;
	let meta = tokio::fs::metadata(path)
		.await
		.map_err(|e| SyncError::InvalidSource { path: path.clone(), reason: e.to_string() })?;
	if !meta.is_dir() {
		return Err(SyncError::InvalidSource {
			path: path.clone(),
			reason: "not a directory".to_string(),
		});
	}
	Ok(())
}

/// Runs synchronizations from one source directory into one store
pub struct Syncer {
	store: Arc<dyn Store>,
	options: SyncOptions,
	callbacks: Arc<dyn SyncCallbacks>,
	cancel: CancellationToken,
}

impl Syncer {
	pub fn new(store: Arc<dyn Store>, options: SyncOptions) -> Self {
		Syncer {
			store,
			options,
			callbacks: Arc::new(NoCallbacks),
			cancel: CancellationToken::new(),
		}
	}

	pub fn with_callbacks(mut self, callbacks: Arc<dyn SyncCallbacks>) -> Self {
		self.callbacks = callbacks;
		self
	}

	pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
		self.cancel = cancel;
		self
	}

	pub fn options(&self) -> &SyncOptions {
		&self.options
	}

	/// Perform one run. Every invocation re-derives state from the source
	/// tree and the store.
	pub async fn run(&self) -> Result<SyncReport, SyncError> {
		let ctx = RunContext {
			store: self.store.as_ref(),
			options: &self.options,
			callbacks: self.callbacks.as_ref(),
			cancel: &self.cancel,
		};
		let mut report = SyncReport::default();

		ctx.phase(Phase::Validate, true);
		validate_source(&self.options).await?;
		ctx.phase(Phase::Validate, false);

		info!(
			"Syncing {}{}",
			self.options.source.display(),
			if self.options.dry_run { " (dry run)" } else { "" }
		);

		ctx.phase(Phase::Upload, true);
		diff::upload_phase(&ctx, &mut report).await?;
		ctx.phase(Phase::Upload, false);
		info!(
			"Upload phase done: {} files scanned, {} up to date, {} to upload",
			report.files_scanned,
			report.files_up_to_date,
			report.uploads().len()
		);

		if self.options.mirror {
			ctx.phase(Phase::Mirror, true);
			mirror::mirror_phase(&ctx, &mut report).await?;
			ctx.phase(Phase::Mirror, false);
			info!(
				"Mirror phase done: {} stored keys, {} to delete",
				report.remote_keys,
				report.deletes().len()
			);
		}

		Ok(report)
	}
}

/// Fluent construction of a [`Syncer`]
#[derive(Default)]
pub struct SyncBuilder {
	options: SyncOptions,
	callbacks: Option<Arc<dyn SyncCallbacks>>,
	cancel: Option<CancellationToken>,
}

impl SyncBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn source(mut self, source: impl Into<PathBuf>) -> Self {
		self.options.source = source.into();
		self
	}

	pub fn dry_run(mut self, dry_run: bool) -> Self {
		self.options.dry_run = dry_run;
		self
	}

	pub fn mirror(mut self, mirror: bool) -> Self {
		self.options.mirror = mirror;
		self
	}

	pub fn callbacks(mut self, callbacks: Arc<dyn SyncCallbacks>) -> Self {
		self.callbacks = Some(callbacks);
		self
	}

	pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
		self.cancel = Some(cancel);
		self
	}

	pub fn build(self, store: Arc<dyn Store>) -> Syncer {
		let mut syncer = Syncer::new(store, self.options);
		if let Some(callbacks) = self.callbacks {
			syncer = syncer.with_callbacks(callbacks);
		}
		if let Some(cancel) = self.cancel {
			syncer = syncer.with_cancel_token(cancel);
		}
		syncer
	}

	pub async fn run(self, store: Arc<dyn Store>) -> Result<SyncReport, SyncError> {
		self.build(store).run().await
	}
}

/// Run a single synchronization with default callbacks.
pub async fn sync(store: Arc<dyn Store>, options: SyncOptions) -> Result<SyncReport, SyncError> {
	Syncer::new(store, options).run().await
}


// vim: ts=4
