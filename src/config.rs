//! Configuration for the foldersync command
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (`Config::default()`)
//! 2. Config file (`--config FILE`, else `~/.config/foldersync/config.toml`)
//! 3. Environment variables (`FOLDERSYNC_*` prefix)
//! 4. CLI flags (highest priority)

use serde::{Deserialize, Serialize};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SyncError;
use crate::store::S3StoreConfig;
use crate::sync::SyncOptions;

pub const ENV_PREFIX: &str = "FOLDERSYNC_";

/// Unified configuration for a foldersync invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	/// Source directory
	pub source: Option<PathBuf>,

	/// Destination bucket
	pub bucket: Option<String>,

	/// Key prefix within the bucket
	pub prefix: String,

	/// AWS region
	pub region: String,

	/// Storage class for uploads (GLACIER_IR, STANDARD_IA, STANDARD, ...)
	pub storage_class: String,

	/// Custom S3-compatible endpoint
	pub endpoint_url: Option<String>,

	/// Print actions without making changes
	pub dry_run: bool,

	/// Delete stored objects absent from the source
	pub delete: bool,

	/// Default log filter when RUST_LOG is unset
	pub log_level: String,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			source: None,
			bucket: None,
			prefix: String::new(),
			region: "us-east-1".to_string(),
			storage_class: "GLACIER_IR".to_string(),
			endpoint_url: None,
			dry_run: false,
			delete: false,
			log_level: "info".to_string(),
		}
	}
}

/// Values given on the command line; `None` leaves lower layers untouched
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub source: Option<PathBuf>,
	pub bucket: Option<String>,
	pub prefix: Option<String>,
	pub region: Option<String>,
	pub storage_class: Option<String>,
	pub endpoint_url: Option<String>,
	pub dry_run: bool,
	pub delete: bool,
}

fn parse_bool(name: &str, value: &str) -> Result<bool, SyncError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" | "" => Ok(false),
		other => Err(SyncError::InvalidConfig {
			message: format!("{}{}: expected a boolean, got {:?}", ENV_PREFIX, name, other),
		}),
	}
}

impl Config {
	/// Default config file location, honoring `XDG_CONFIG_HOME`
	pub fn default_path() -> Option<PathBuf> {
		if let Ok(dir) = env::var("XDG_CONFIG_HOME") {
			if !dir.is_empty() {
				return Some(PathBuf::from(dir).join("foldersync").join("config.toml"));
			}
		}
		env::var("HOME")
			.ok()
			.map(|home| PathBuf::from(home).join(".config").join("foldersync").join("config.toml"))
	}

	/// Parse a TOML config file
	pub fn from_file(path: &Path) -> Result<Config, SyncError> {
		let text = fs::read_to_string(path).map_err(|e| SyncError::InvalidConfig {
			message: format!("cannot read {}: {}", path.display(), e),
		})?;
		Self::from_toml(&text).map_err(|e| SyncError::InvalidConfig {
			message: format!("{}: {}", path.display(), e),
		})
	}

	pub fn from_toml(text: &str) -> Result<Config, toml::de::Error> {
		toml::from_str(text)
	}

	/// Apply `FOLDERSYNC_*` variables from `vars`.
	///
	/// Other variables are ignored whatever their encoding; a foldersync
	/// variable whose value is not valid Unicode is a config error.
	pub fn apply_env<I, K, V>(&mut self, vars: I) -> Result<(), SyncError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<OsString>,
		V: Into<OsString>,
	{
		for (name, value) in vars {
			let name = match name.into().into_string() {
				Ok(name) => name,
				Err(_) => continue,
			};
			let name = match name.strip_prefix(ENV_PREFIX) {
				Some(n) => n.to_string(),
				None => continue,
			};
			let value = value.into().into_string().map_err(|_| SyncError::InvalidConfig {
				message: format!("{}{}: value is not valid Unicode", ENV_PREFIX, name),
			})?;
			match name.as_str() {
				"SOURCE" => self.source = Some(PathBuf::from(value)),
				"BUCKET" => self.bucket = Some(value),
				"PREFIX" => self.prefix = value,
				"REGION" => self.region = value,
				"STORAGE_CLASS" => self.storage_class = value,
				"ENDPOINT_URL" => self.endpoint_url = Some(value),
				"DRY_RUN" => self.dry_run = parse_bool(&name, &value)?,
				"DELETE" => self.delete = parse_bool(&name, &value)?,
				"LOG_LEVEL" => self.log_level = value,
				_ => {}
			}
		}
		Ok(())
	}

	/// Apply command-line values. Flags can only switch booleans on.
	pub fn apply_cli(&mut self, cli: CliOverrides) {
		if let Some(source) = cli.source {
			self.source = Some(source);
		}
		if let Some(bucket) = cli.bucket {
			self.bucket = Some(bucket);
		}
		if let Some(prefix) = cli.prefix {
			self.prefix = prefix;
		}
		if let Some(region) = cli.region {
			self.region = region;
		}
		if let Some(storage_class) = cli.storage_class {
			self.storage_class = storage_class;
		}
		if let Some(endpoint_url) = cli.endpoint_url {
			self.endpoint_url = Some(endpoint_url);
		}
		self.dry_run |= cli.dry_run;
		self.delete |= cli.delete;
	}

	/// Build the layered configuration: defaults, file, environment, CLI.
	///
	/// An explicitly named file must exist; the default location is optional.
	pub fn load(explicit: Option<&Path>, cli: CliOverrides) -> Result<Config, SyncError> {
		let mut config = match explicit {
			Some(path) => Self::from_file(path)?,
			None => match Self::default_path() {
				Some(path) if path.is_file() => Self::from_file(&path)?,
				_ => Config::default(),
			},
		};
		config.apply_env(env::vars_os())?;
		config.apply_cli(cli);
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), SyncError> {
		match &self.source {
			Some(source) if !source.as_os_str().is_empty() => {}
			_ => {
				return Err(SyncError::InvalidConfig {
					message: "source directory is required".to_string(),
				})
			}
		}
		match &self.bucket {
			Some(bucket) if !bucket.is_empty() => {}
			_ => {
				return Err(SyncError::InvalidConfig {
					message: "destination bucket is required".to_string(),
				})
			}
		}
		if self.storage_class.is_empty() {
			return Err(SyncError::InvalidConfig {
				message: "storage class must not be empty".to_string(),
			});
		}
		Ok(())
	}

	pub fn sync_options(&self) -> SyncOptions {
		SyncOptions {
			source: self.source.clone().unwrap_or_default(),
			dry_run: self.dry_run,
			mirror: self.delete,
		}
	}

	pub fn store_config(&self) -> S3StoreConfig {
		let mut store = S3StoreConfig::new(self.bucket.clone().unwrap_or_default())
			.with_prefix(self.prefix.clone())
			.with_region(self.region.clone())
			.with_storage_class(self.storage_class.clone());
		if let Some(endpoint) = &self.endpoint_url {
			store = store.with_endpoint_url(endpoint.clone());
		}
		store
	}
}


// vim: ts=4
