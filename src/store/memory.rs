//! In-memory store, intended primarily for testing
//!
//! Objects live in a map keyed by full key, so a prefix can be configured
//! and foreign keys outside the scope can be seeded. Every call is recorded
//! in order, and failures can be injected per operation and key.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

use super::{ObjectMeta, Store, StoreResult};
use crate::error::{StoreError, StoreOp};
use crate::keys::KeyMapper;

/// A call observed by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
	Put(String),
	Stat(String),
	List,
	Delete(String),
}

#[derive(Debug, Clone)]
struct StoredObject {
	meta: ObjectMeta,
	data: Vec<u8>,
}

#[derive(Debug, Clone)]
struct Failure {
	op: StoreOp,
	key: Option<String>,
	message: String,
}

/// In-memory implementation of [`Store`]
#[derive(Debug, Default)]
pub struct MemoryStore {
	mapper: KeyMapper,
	objects: RwLock<BTreeMap<String, StoredObject>>,
	calls: Mutex<Vec<StoreCall>>,
	failures: Mutex<Vec<Failure>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
	m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a store whose relative keys live under `prefix`
	pub fn with_prefix(prefix: impl Into<String>) -> Self {
		MemoryStore { mapper: KeyMapper::new(prefix), ..Self::default() }
	}

	fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, StoredObject>> {
		self.objects.read().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, StoredObject>> {
		self.objects.write().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	/// Seed an object under a relative key without recording a call
	pub fn insert(&self, key: &str, meta: ObjectMeta) {
		self.insert_full(&self.mapper.full_key(key), meta);
	}

	/// Seed an object under a literal full key, which may be out of scope
	pub fn insert_full(&self, full_key: &str, meta: ObjectMeta) {
		self.write().insert(full_key.to_string(), StoredObject { meta, data: Vec::new() });
	}

	pub fn contains(&self, key: &str) -> bool {
		self.read().contains_key(&self.mapper.full_key(key))
	}

	pub fn contains_full(&self, full_key: &str) -> bool {
		self.read().contains_key(full_key)
	}

	pub fn meta(&self, key: &str) -> Option<ObjectMeta> {
		self.read().get(&self.mapper.full_key(key)).map(|o| o.meta)
	}

	/// Content of an object written through [`Store::put`]
	pub fn content(&self, key: &str) -> Option<Vec<u8>> {
		self.read().get(&self.mapper.full_key(key)).map(|o| o.data.clone())
	}

	pub fn len(&self) -> usize {
		self.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.read().is_empty()
	}

	/// Every call in the order it was made
	pub fn calls(&self) -> Vec<StoreCall> {
		lock(&self.calls).clone()
	}

	/// Keys passed to `put`, in call order
	pub fn puts(&self) -> Vec<String> {
		lock(&self.calls)
			.iter()
			.filter_map(|c| match c {
				StoreCall::Put(key) => Some(key.clone()),
				_ => None,
			})
			.collect()
	}

	/// Keys passed to `delete`, in call order
	pub fn deletes(&self) -> Vec<String> {
		lock(&self.calls)
			.iter()
			.filter_map(|c| match c {
				StoreCall::Delete(key) => Some(key.clone()),
				_ => None,
			})
			.collect()
	}

	pub fn clear_calls(&self) {
		lock(&self.calls).clear();
	}

	/// Make `op` fail with a backend error. `key` of `None` matches any key.
	pub fn fail_on(&self, op: StoreOp, key: Option<&str>, message: &str) {
		lock(&self.failures).push(Failure {
			op,
			key: key.map(str::to_string),
			message: message.to_string(),
		});
	}

	fn record(&self, op: StoreOp, key: Option<&str>) -> StoreResult<()> {
		let call = match (op, key) {
			(StoreOp::Put, Some(k)) => StoreCall::Put(k.to_string()),
			(StoreOp::Stat, Some(k)) => StoreCall::Stat(k.to_string()),
			(StoreOp::Delete, Some(k)) => StoreCall::Delete(k.to_string()),
			_ => StoreCall::List,
		};
		lock(&self.calls).push(call);

		let failures = lock(&self.failures);
		let hit = failures.iter().find(|f| {
			f.op == op && (f.key.is_none() || f.key.as_deref() == key)
		});
		match hit {
			Some(f) => Err(StoreError::Backend { message: f.message.clone() }),
			None => Ok(()),
		}
	}
}

#[async_trait]
impl Store for MemoryStore {
	async fn put(
		&self,
		key: &str,
		mut body: File,
		size: u64,
		mtime: i64,
		_cancel: &CancellationToken,
	) -> StoreResult<()> {
		self.record(StoreOp::Put, Some(key))?;
		let mut data = Vec::new();
		body.read_to_end(&mut data).await?;
		let object = StoredObject { meta: ObjectMeta::new(size, mtime), data };
		self.write().insert(self.mapper.full_key(key), object);
		Ok(())
	}

	async fn stat(&self, key: &str, _cancel: &CancellationToken) -> StoreResult<Option<ObjectMeta>> {
		self.record(StoreOp::Stat, Some(key))?;
		Ok(self.meta(key))
	}

	async fn list(&self, _cancel: &CancellationToken) -> StoreResult<Vec<String>> {
		self.record(StoreOp::List, None)?;
		Ok(self
			.read()
			.keys()
			.filter(|full| self.mapper.in_scope(full))
			.map(|full| self.mapper.rel_key(full))
			.collect())
	}

	async fn delete(&self, key: &str, _cancel: &CancellationToken) -> StoreResult<()> {
		self.record(StoreOp::Delete, Some(key))?;
		match self.write().remove(&self.mapper.full_key(key)) {
			Some(_) => Ok(()),
			None => Err(StoreError::NotFound),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	async fn open_with(dir: &TempDir, content: &[u8]) -> File {
		let path = dir.path().join("body");
		std::fs::write(&path, content).unwrap();
		File::open(&path).await.unwrap()
	}

	#[tokio::test]
	async fn test_stat_absent_is_not_an_error() {
		let store = MemoryStore::new();
		let cancel = CancellationToken::new();
		assert_eq!(store.stat("missing.txt", &cancel).await.unwrap(), None);
		assert_eq!(store.calls(), vec![StoreCall::Stat("missing.txt".to_string())]);
	}

	#[tokio::test]
	async fn test_put_then_stat() {
		let dir = TempDir::new().unwrap();
		let store = MemoryStore::new();
		let cancel = CancellationToken::new();

		let body = open_with(&dir, b"hello").await;
		store.put("a.txt", body, 5, 1_700_000_000, &cancel).await.unwrap();

		let meta = store.stat("a.txt", &cancel).await.unwrap();
		assert_eq!(meta, Some(ObjectMeta::new(5, 1_700_000_000)));
		assert_eq!(store.content("a.txt"), Some(b"hello".to_vec()));
	}

	#[tokio::test]
	async fn test_list_is_scoped_to_prefix() {
		let store = MemoryStore::with_prefix("backups");
		let cancel = CancellationToken::new();
		store.insert("a.txt", ObjectMeta::new(1, 0));
		store.insert("d/b.txt", ObjectMeta::new(1, 0));
		store.insert_full("other/c.txt", ObjectMeta::new(1, 0));

		assert!(store.contains_full("backups/a.txt"));
		let keys = store.list(&cancel).await.unwrap();
		assert_eq!(keys, vec!["a.txt".to_string(), "d/b.txt".to_string()]);
	}

	#[tokio::test]
	async fn test_delete_absent_reports_not_found() {
		let store = MemoryStore::new();
		let cancel = CancellationToken::new();
		store.insert("a.txt", ObjectMeta::new(1, 0));

		store.delete("a.txt", &cancel).await.unwrap();
		assert!(!store.contains("a.txt"));
		assert!(matches!(store.delete("a.txt", &cancel).await, Err(StoreError::NotFound)));
		assert_eq!(store.deletes(), vec!["a.txt".to_string(), "a.txt".to_string()]);
	}

	#[tokio::test]
	async fn test_injected_failure() {
		let store = MemoryStore::new();
		let cancel = CancellationToken::new();
		store.fail_on(StoreOp::Stat, Some("bad.txt"), "access denied");

		assert!(store.stat("good.txt", &cancel).await.is_ok());
		let err = store.stat("bad.txt", &cancel).await.unwrap_err();
		assert_eq!(err.to_string(), "access denied");
	}
}

// vim: ts=4
