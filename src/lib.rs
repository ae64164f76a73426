//! # foldersync - one-way directory to object store synchronizer
//!
//! foldersync uploads every file of a local directory tree whose size or
//! modification time differs from the stored object, and optionally deletes
//! stored objects that no longer exist locally. Re-running is always safe:
//! an unchanged tree produces no actions.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use foldersync::store::{S3Store, S3StoreConfig};
//! use foldersync::sync::{sync, SyncOptions};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(S3Store::new(S3StoreConfig::new("archive").with_prefix("photos")).await);
//!     let options = SyncOptions { source: "./photos".into(), dry_run: true, mirror: false };
//!     let report = sync(store, options).await?;
//!     for record in &report.actions {
//!         println!("{}", record.action);
//!     }
//!     Ok(())
//! }
//! ```

pub mod callbacks;
pub mod config;
pub mod diff;
pub mod error;
pub mod keys;
pub mod logging;
pub mod mirror;
pub mod signals;
pub mod store;
pub mod sync;
pub mod types;
pub mod walk;

// Re-export commonly used types and functions
pub use config::Config;
pub use error::{StoreError, StoreOp, SyncError};
pub use store::{ObjectMeta, Store};
pub use sync::{sync, SyncBuilder, SyncOptions, SyncReport, Syncer};
pub use types::{Action, ActionKind, ActionOutcome, ActionRecord};

// vim: ts=4
