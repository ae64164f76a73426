//! End-to-end tests of the upload phase against the in-memory store
//!
//! These tests build real source trees in temporary directories, pin file
//! modification times with `filetime`, and inspect both the returned report
//! and the calls the store received.

use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use foldersync::callbacks::SyncEvent;
use foldersync::store::memory::StoreCall;
use foldersync::store::MemoryStore;
use foldersync::{
	sync, ActionOutcome, ObjectMeta, StoreOp, SyncBuilder, SyncError, SyncOptions,
};

const MTIME: i64 = 1_700_000_000;

/// Create a file (and its parent directories) with a pinned mtime
fn create_file(dir: &Path, name: &str, content: &str, mtime: i64, nanos: u32) -> PathBuf {
	let path = dir.join(name);
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).unwrap();
	}
	fs::write(&path, content).unwrap();
	set_file_mtime(&path, FileTime::from_unix_time(mtime, nanos)).unwrap();
	path
}

fn options(src: &TempDir) -> SyncOptions {
	SyncOptions { source: src.path().to_path_buf(), dry_run: false, mirror: false }
}

#[tokio::test]
async fn test_uploads_new_files() {
	let src = TempDir::new().unwrap();
	create_file(src.path(), "a.txt", "hello", MTIME, 0);
	create_file(src.path(), "b.txt", "world", MTIME, 0);

	let store = Arc::new(MemoryStore::new());
	let report = sync(store.clone(), options(&src)).await.expect("sync should succeed");

	assert_eq!(report.uploads(), vec!["a.txt", "b.txt"]);
	assert_eq!(store.puts(), vec!["a.txt".to_string(), "b.txt".to_string()]);
	assert_eq!(store.meta("a.txt"), Some(ObjectMeta::new(5, MTIME)));
	assert_eq!(store.content("b.txt"), Some(b"world".to_vec()));
	assert_eq!(report.bytes_uploaded, 10);
	assert!(report.actions.iter().all(|r| r.outcome == ActionOutcome::Applied));
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
	let src = TempDir::new().unwrap();
	create_file(src.path(), "a.txt", "hello", MTIME, 123_000_000);
	create_file(src.path(), "dir/b.txt", "world", MTIME + 7, 0);

	let store = Arc::new(MemoryStore::new());
	let first = sync(store.clone(), options(&src)).await.unwrap();
	assert_eq!(first.uploads().len(), 2);

	store.clear_calls();
	let second = sync(store.clone(), options(&src)).await.unwrap();
	assert!(second.actions.is_empty(), "unexpected actions: {:?}", second.actions);
	assert_eq!(second.files_up_to_date, 2);
	assert!(store.puts().is_empty());
}

#[tokio::test]
async fn test_skips_up_to_date_file() {
	let src = TempDir::new().unwrap();
	create_file(src.path(), "a.txt", "hello", MTIME, 0);

	let store = Arc::new(MemoryStore::new());
	store.insert("a.txt", ObjectMeta::new(5, MTIME));

	let report = sync(store.clone(), options(&src)).await.unwrap();
	assert!(report.actions.is_empty());
	assert_eq!(store.calls(), vec![StoreCall::Stat("a.txt".to_string())]);
}

#[tokio::test]
async fn test_subsecond_jitter_does_not_trigger_upload() {
	let src = TempDir::new().unwrap();
	create_file(src.path(), "a.txt", "hello", MTIME, 999_999_999);

	let store = Arc::new(MemoryStore::new());
	store.insert("a.txt", ObjectMeta::new(5, MTIME));

	let report = sync(store.clone(), options(&src)).await.unwrap();
	assert!(report.actions.is_empty());
}

#[tokio::test]
async fn test_reuploads_when_mtime_differs() {
	let src = TempDir::new().unwrap();
	create_file(src.path(), "a.txt", "hello", MTIME, 0);

	let store = Arc::new(MemoryStore::new());
	store.insert("a.txt", ObjectMeta::new(5, MTIME - 3600));

	let report = sync(store.clone(), options(&src)).await.unwrap();
	assert_eq!(report.uploads(), vec!["a.txt"]);
	assert_eq!(store.meta("a.txt"), Some(ObjectMeta::new(5, MTIME)));
}

#[tokio::test]
async fn test_reuploads_when_mtime_differs_by_one_second() {
	let src = TempDir::new().unwrap();
	create_file(src.path(), "a.txt", "hello", MTIME, 0);

	let store = Arc::new(MemoryStore::new());
	store.insert("a.txt", ObjectMeta::new(5, MTIME + 1));

	let report = sync(store.clone(), options(&src)).await.unwrap();
	assert_eq!(report.uploads(), vec!["a.txt"]);
}

#[tokio::test]
async fn test_reuploads_when_size_differs() {
	let src = TempDir::new().unwrap();
	create_file(src.path(), "a.txt", "hello", MTIME, 0);

	let store = Arc::new(MemoryStore::new());
	store.insert("a.txt", ObjectMeta::new(6, MTIME));

	let report = sync(store.clone(), options(&src)).await.unwrap();
	assert_eq!(report.uploads(), vec!["a.txt"]);
	assert_eq!(store.puts(), vec!["a.txt".to_string()]);
}

#[tokio::test]
async fn test_zero_byte_file_is_synced() {
	let src = TempDir::new().unwrap();
	create_file(src.path(), "empty.txt", "", MTIME, 0);

	let store = Arc::new(MemoryStore::new());
	let report = sync(store.clone(), options(&src)).await.unwrap();
	assert_eq!(report.uploads(), vec!["empty.txt"]);
	assert_eq!(store.meta("empty.txt"), Some(ObjectMeta::new(0, MTIME)));

	let again = sync(store.clone(), options(&src)).await.unwrap();
	assert!(again.actions.is_empty());
}

#[tokio::test]
async fn test_nested_directories_use_forward_slashes() {
	let src = TempDir::new().unwrap();
	create_file(src.path(), "a/x.txt", "x", MTIME, 0);
	create_file(src.path(), "a/b/y.txt", "y", MTIME, 0);
	fs::create_dir_all(src.path().join("empty/dir")).unwrap();

	let store = Arc::new(MemoryStore::new());
	let report = sync(store.clone(), options(&src)).await.unwrap();

	assert_eq!(report.uploads(), vec!["a/b/y.txt", "a/x.txt"]);
	for key in store.puts() {
		assert!(!key.contains('\\'), "key {:?} contains a backslash", key);
	}
	assert_eq!(report.files_scanned, 2);
}

#[tokio::test]
async fn test_dry_run_uploads_nothing() {
	let src = TempDir::new().unwrap();
	create_file(src.path(), "new.txt", "new", MTIME, 0);

	let store = Arc::new(MemoryStore::new());
	let report = SyncBuilder::new().source(src.path()).dry_run(true).run(store.clone()).await.unwrap();

	assert_eq!(report.uploads(), vec!["new.txt"]);
	assert_eq!(report.actions[0].outcome, ActionOutcome::DryRun);
	assert!(store.puts().is_empty());
	assert!(store.is_empty());
	assert_eq!(report.bytes_uploaded, 0);
}

#[tokio::test]
async fn test_prefix_scopes_stored_keys() {
	let src = TempDir::new().unwrap();
	create_file(src.path(), "a/b.txt", "b", MTIME, 0);

	let store = Arc::new(MemoryStore::with_prefix("backups/"));
	let report = sync(store.clone(), options(&src)).await.unwrap();

	assert_eq!(report.uploads(), vec!["a/b.txt"]);
	assert!(store.contains_full("backups/a/b.txt"));
}

#[tokio::test]
async fn test_missing_source_fails_before_any_store_call() {
	let store = Arc::new(MemoryStore::new());
	let options = SyncOptions { source: PathBuf::from("/nonexistent/path"), dry_run: false, mirror: true };

	let err = sync(store.clone(), options).await.unwrap_err();
	assert!(matches!(err, SyncError::InvalidSource { .. }));
	assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_source_must_be_a_directory() {
	let dir = TempDir::new().unwrap();
	let file = create_file(dir.path(), "plain.txt", "x", MTIME, 0);

	let store = Arc::new(MemoryStore::new());
	let options = SyncOptions { source: file, dry_run: false, mirror: false };

	let err = sync(store.clone(), options).await.unwrap_err();
	assert!(matches!(err, SyncError::InvalidSource { .. }));
	assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_stat_failure_aborts_run() {
	let src = TempDir::new().unwrap();
	create_file(src.path(), "a.txt", "a", MTIME, 0);
	create_file(src.path(), "b.txt", "b", MTIME, 0);
	create_file(src.path(), "c.txt", "c", MTIME, 0);

	let store = Arc::new(MemoryStore::new());
	store.fail_on(StoreOp::Stat, Some("b.txt"), "access denied");

	let err = sync(store.clone(), options(&src)).await.unwrap_err();
	match &err {
		SyncError::Store { op, key, .. } => {
			assert_eq!(*op, StoreOp::Stat);
			assert_eq!(key.as_deref(), Some("b.txt"));
		}
		other => panic!("unexpected error: {:?}", other),
	}
	assert_eq!(err.to_string(), "stat b.txt: access denied");

	// a.txt was uploaded before the failure and stays uploaded; c.txt was never looked at
	assert_eq!(store.puts(), vec!["a.txt".to_string()]);
	assert!(!store.calls().contains(&StoreCall::Stat("c.txt".to_string())));
}

#[tokio::test]
async fn test_put_failure_aborts_run() {
	let src = TempDir::new().unwrap();
	create_file(src.path(), "a.txt", "a", MTIME, 0);
	create_file(src.path(), "b.txt", "b", MTIME, 0);

	let store = Arc::new(MemoryStore::new());
	store.fail_on(StoreOp::Put, Some("a.txt"), "network unreachable");

	let err = sync(store.clone(), options(&src)).await.unwrap_err();
	assert_eq!(err.to_string(), "put a.txt: network unreachable");
	assert!(!store.contains("a.txt"));
	assert!(!store.calls().contains(&StoreCall::Stat("b.txt".to_string())));
}

#[cfg(unix)]
#[tokio::test]
async fn test_unreadable_directory_aborts_run() {
	use std::os::unix::fs::PermissionsExt;

	let src = TempDir::new().unwrap();
	create_file(src.path(), "a.txt", "a", MTIME, 0);
	create_file(src.path(), "b/inner.txt", "i", MTIME, 0);
	create_file(src.path(), "c.txt", "c", MTIME, 0);

	let locked = src.path().join("b");
	fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
	if fs::read_dir(&locked).is_ok() {
		// privileged users read through the mode bits
		fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
		return;
	}

	let store = Arc::new(MemoryStore::new());
	let result = sync(store.clone(), options(&src)).await;
	fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

	let err = result.unwrap_err();
	assert!(matches!(err, SyncError::Walk { .. }), "unexpected error: {:?}", err);
	assert_eq!(store.puts(), vec!["a.txt".to_string()]);
	assert!(!store.calls().contains(&StoreCall::Stat("c.txt".to_string())));
}

#[tokio::test]
async fn test_action_is_reported_before_upload() {
	let src = TempDir::new().unwrap();
	create_file(src.path(), "a.txt", "a", MTIME, 0);
	create_file(src.path(), "b.txt", "b", MTIME, 0);

	let store = Arc::new(MemoryStore::new());
	let observed = Arc::new(Mutex::new(Vec::new()));

	let callbacks = {
		let store = store.clone();
		let observed = observed.clone();
		move |event: &SyncEvent| {
			if let SyncEvent::Action(action) = event {
				observed.lock().unwrap().push((action.key.clone(), store.puts().len()));
			}
		}
	};

	SyncBuilder::new()
		.source(src.path())
		.callbacks(Arc::new(callbacks))
		.run(store.clone())
		.await
		.unwrap();

	let observed = observed.lock().unwrap().clone();
	assert_eq!(observed, vec![("a.txt".to_string(), 0), ("b.txt".to_string(), 1)]);
}

// vim: ts=4
