//! Object store contract
//!
//! Every destination backend implements [`Store`]. The sync engine depends
//! only on this trait; keys passed in and out are relative keys, and the
//! backend owns the mapping to its own full keys.

pub mod memory;
pub mod s3;

use async_trait::async_trait;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs::File;
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;

pub use self::memory::MemoryStore;
pub use self::s3::{S3Store, S3StoreConfig};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// What is known about a stored object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectMeta {
	/// Size in bytes
	pub size: u64,

	/// Modification time of the source file in whole seconds since the Unix
	/// epoch, or `None` when the object carries no usable timestamp
	pub mtime: Option<i64>,
}

impl ObjectMeta {
	pub fn new(size: u64, mtime: i64) -> Self {
		ObjectMeta { size, mtime: Some(mtime) }
	}
}

/// Truncate a timestamp to whole seconds since the Unix epoch.
///
/// Times before the epoch round towards negative infinity so that every
/// instant within one wall-clock second maps to the same value.
pub fn unix_seconds(time: SystemTime) -> i64 {
	match time.duration_since(UNIX_EPOCH) {
		Ok(after) => after.as_secs() as i64,
		Err(e) => {
			let before = e.duration();
			let secs = before.as_secs() as i64;
			if before.subsec_nanos() > 0 {
				-secs - 1
			} else {
				-secs
			}
		}
	}
}

/// Capability set a sync destination must provide
///
/// Implementations must be safe to call repeatedly with the same arguments:
/// the engine relies on re-runs to finish interrupted work.
#[async_trait]
pub trait Store: Send + Sync {
	/// Upload `body` under `key`, replacing any existing object.
	///
	/// `size` and `mtime` must be persisted so that a later [`Store::stat`]
	/// returns them.
	async fn put(
		&self,
		key: &str,
		body: File,
		size: u64,
		mtime: i64,
		cancel: &CancellationToken,
	) -> StoreResult<()>;

	/// Metadata for `key`, or `None` if no such object exists.
	async fn stat(&self, key: &str, cancel: &CancellationToken) -> StoreResult<Option<ObjectMeta>>;

	/// All relative keys currently held in this store's scope, in no
	/// particular order.
	async fn list(&self, cancel: &CancellationToken) -> StoreResult<Vec<String>>;

	/// Remove `key`. Backends may report [`StoreError::NotFound`] for absent
	/// keys; callers treat that as success.
	async fn delete(&self, key: &str, cancel: &CancellationToken) -> StoreResult<()>;
}


// vim: ts=4
