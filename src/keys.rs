//! Mapping between local paths, relative keys and full object keys
//!
//! A *relative key* is a forward-slash path with no leading slash that
//! identifies a file relative to the synchronized root. A *full key* is the
//! relative key joined with the configured prefix, i.e. the literal key used
//! against the object store.

use std::path::{Component, Path, PathBuf};

/// Join `prefix` and `relative` into a full object key.
///
/// Leading slashes on `relative` and trailing slashes on `prefix` are
/// stripped, so `"backups/"` and `"backups"` map identically.
pub fn full_key(prefix: &str, relative: &str) -> String {
	let relative = relative.trim_start_matches('/');
	if prefix.is_empty() {
		return relative.to_string();
	}
	format!("{}/{}", prefix.trim_end_matches('/'), relative)
}

/// Strip `prefix` from a full object key, yielding the relative key.
///
/// Keys that do not start with the prefix are returned unchanged.
pub fn rel_key(prefix: &str, full: &str) -> String {
	if prefix.is_empty() {
		return full.to_string();
	}
	let scope = scope_prefix(prefix);
	full.strip_prefix(scope.as_str()).unwrap_or(full).to_string()
}

/// The listing scope for a prefix: empty, or the prefix with exactly one
/// trailing slash.
pub fn scope_prefix(prefix: &str) -> String {
	if prefix.is_empty() {
		return String::new();
	}
	format!("{}/", prefix.trim_end_matches('/'))
}

/// Convert a path relative to the source root into a relative key.
///
/// Components are joined with `/` whatever the host separator is.
pub fn path_to_key(relative: &Path) -> String {
	let mut key = String::new();
	for component in relative.components() {
		if let Component::Normal(part) = component {
			if !key.is_empty() {
				key.push('/');
			}
			key.push_str(&part.to_string_lossy());
		}
	}
	key
}

/// Resolve a relative key to a path under `root` using host separators.
///
/// Returns `None` when the key could escape `root` (absolute keys or `..`
/// segments); such a key cannot name anything inside the tree.
pub fn key_to_path(root: &Path, key: &str) -> Option<PathBuf> {
	if key.starts_with('/') {
		return None;
	}
	let mut path = root.to_path_buf();
	for segment in key.split('/') {
		match segment {
			"" | "." => continue,
			".." => return None,
			_ => {}
		}
		let segment_path = Path::new(segment);
		if segment_path.is_absolute() || segment_path.components().count() != 1 {
			return None;
		}
		path.push(segment_path);
	}
	Some(path)
}

/// Key mapper bound to a single prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyMapper {
	prefix: String,
}

impl KeyMapper {
	pub fn new(prefix: impl Into<String>) -> Self {
		KeyMapper { prefix: prefix.into() }
	}

	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	pub fn full_key(&self, relative: &str) -> String {
		full_key(&self.prefix, relative)
	}

	pub fn rel_key(&self, full: &str) -> String {
		rel_key(&self.prefix, full)
	}

	/// Whether a full key lies inside this mapper's scope
	pub fn in_scope(&self, full: &str) -> bool {
		full.starts_with(scope_prefix(&self.prefix).as_str())
	}

	pub fn scope(&self) -> String {
		scope_prefix(&self.prefix)
	}
}


// vim: ts=4
