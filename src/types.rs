//! Action records and run phases

use std::fmt;

/// Kind of side effect a sync run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
	Upload,
	Delete,
}

impl fmt::Display for ActionKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ActionKind::Upload => write!(f, "upload"),
			ActionKind::Delete => write!(f, "delete"),
		}
	}
}

/// An intended upload or delete of one relative key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Action {
	pub kind: ActionKind,
	pub key: String,
}

impl Action {
	pub fn upload(key: impl Into<String>) -> Self {
		Action { kind: ActionKind::Upload, key: key.into() }
	}

	pub fn delete(key: impl Into<String>) -> Self {
		Action { kind: ActionKind::Delete, key: key.into() }
	}
}

/// Renders as the single-line log form, e.g. `upload a/b.txt`
impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.kind, self.key)
	}
}

/// What happened to an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
	/// The side effect was performed
	Applied,
	/// Dry run: the side effect was suppressed
	DryRun,
}

/// An action together with its outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
	pub action: Action,
	pub outcome: ActionOutcome,
}

/// Phases of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	Validate,
	Upload,
	Mirror,
}

impl fmt::Display for Phase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Phase::Validate => write!(f, "validate"),
			Phase::Upload => write!(f, "upload"),
			Phase::Mirror => write!(f, "mirror"),
		}
	}
}


// vim: ts=4
