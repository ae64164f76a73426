//! Lazy traversal of the source tree
//!
//! [`Walk`] yields every regular file below a root, depth first, with the
//! entries of each directory visited in lexical order. Directories are
//! descended into but never yielded; symbolic links and special files are
//! skipped and never followed. The first I/O error ends the walk.

use std::fs::{self, DirEntry};
use std::io;
use std::path::{Path, PathBuf};
use std::vec;

use crate::error::SyncError;
use crate::logging::*;
use crate::store::unix_seconds;

/// A regular file found by [`Walk`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
	/// Absolute (or root-joined) path of the file
	pub path: PathBuf,
	/// Path relative to the walk root
	pub relative: PathBuf,
	/// Size in bytes
	pub size: u64,
	/// Modification time truncated to whole seconds since the Unix epoch
	pub mtime: i64,
}

/// Depth-first iterator over the regular files below a root
pub struct Walk {
	root: PathBuf,
	stack: Vec<vec::IntoIter<DirEntry>>,
	pending_root: bool,
	failed: bool,
}

impl Walk {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Walk { root: root.into(), stack: Vec::new(), pending_root: true, failed: false }
	}

	fn fail(&mut self, path: &Path, source: io::Error) -> Option<Result<LocalFile, SyncError>> {
		self.failed = true;
		self.stack.clear();
		Some(Err(SyncError::Walk { path: path.to_path_buf(), source }))
	}

	fn read_sorted(dir: &Path) -> io::Result<vec::IntoIter<DirEntry>> {
		let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
		entries.sort_by_key(|e| e.file_name());
		Ok(entries.into_iter())
	}
}

impl Iterator for Walk {
	type Item = Result<LocalFile, SyncError>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.failed {
			return None;
		}

		if self.pending_root {
			self.pending_root = false;
			let root = self.root.clone();
			match Self::read_sorted(&root) {
				Ok(entries) => self.stack.push(entries),
				Err(e) => return self.fail(&root, e),
			}
		}

		loop {
			let entry = match self.stack.last_mut()?.next() {
				Some(entry) => entry,
				None => {
					self.stack.pop();
					continue;
				}
			};

			let path = entry.path();
			let file_type = match entry.file_type() {
				Ok(t) => t,
				Err(e) => return self.fail(&path, e),
			};

			if file_type.is_dir() {
				match Self::read_sorted(&path) {
					Ok(entries) => self.stack.push(entries),
					Err(e) => return self.fail(&path, e),
				}
				continue;
			}

			if !file_type.is_file() {
				debug!("[walk] skipping non-regular file {}", path.display());
				continue;
			}

			let meta = match entry.metadata() {
				Ok(m) => m,
				Err(e) => return self.fail(&path, e),
			};
			let modified = match meta.modified() {
				Ok(t) => t,
				Err(e) => return self.fail(&path, e),
			};

			let relative = path.strip_prefix(&self.root).unwrap_or(&path).to_path_buf();
			return Some(Ok(LocalFile {
				path,
				relative,
				size: meta.len(),
				mtime: unix_seconds(modified),
			}));
		}
	}
}


// vim: ts=4
