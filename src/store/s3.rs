//! S3 destination
//!
//! Objects are written with two user metadata entries, `mtime` (Unix
//! seconds) and `size` (bytes), which `stat` reads back. Uploads are single
//! `PutObject` requests; objects above the S3 single-part limit fail with a
//! backend error.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::StorageClass;
use aws_sdk_s3::Client;
use std::collections::HashMap;
use tokio::fs::File;
use tokio_util::sync::CancellationToken;

use super::{ObjectMeta, Store, StoreResult};
use crate::error::StoreError;
use crate::keys::KeyMapper;
use crate::logging::*;

const META_MTIME: &str = "mtime";
const META_SIZE: &str = "size";

/// Configuration for [`S3Store`]
#[derive(Debug, Clone, Default)]
pub struct S3StoreConfig {
	/// The S3 bucket name
	pub bucket: String,
	/// Key prefix within the bucket
	pub prefix: String,
	/// Region override; the default provider chain applies otherwise
	pub region: Option<String>,
	/// Custom endpoint URL (MinIO, LocalStack); switches to path-style addressing
	pub endpoint_url: Option<String>,
	/// Storage class for uploaded objects, passed through as-is
	pub storage_class: Option<String>,
}

impl S3StoreConfig {
	pub fn new(bucket: impl Into<String>) -> Self {
		S3StoreConfig { bucket: bucket.into(), ..Self::default() }
	}

	pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.prefix = prefix.into();
		self
	}

	pub fn with_region(mut self, region: impl Into<String>) -> Self {
		self.region = Some(region.into());
		self
	}

	pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
		self.endpoint_url = Some(endpoint_url.into());
		self
	}

	pub fn with_storage_class(mut self, storage_class: impl Into<String>) -> Self {
		self.storage_class = Some(storage_class.into());
		self
	}
}

/// An S3-backed implementation of [`Store`]
pub struct S3Store {
	client: Client,
	bucket: String,
	keys: KeyMapper,
	storage_class: Option<StorageClass>,
}

impl S3Store {
	/// Create a store using the standard AWS credential chain (environment,
	/// `~/.aws`, instance roles, ...).
	pub async fn new(config: S3StoreConfig) -> Self {
		let mut loader = aws_config::defaults(BehaviorVersion::latest());
		if let Some(region) = &config.region {
			loader = loader.region(aws_config::Region::new(region.clone()));
		}
		let aws_config = loader.load().await;

		let mut builder = aws_sdk_s3::config::Builder::from(&aws_config);
		if let Some(endpoint) = &config.endpoint_url {
			builder = builder.endpoint_url(endpoint).force_path_style(true);
		}

		Self::from_client(Client::from_conf(builder.build()), config)
	}

	/// Wrap an already configured client
	pub fn from_client(client: Client, config: S3StoreConfig) -> Self {
		S3Store {
			client,
			bucket: config.bucket,
			keys: KeyMapper::new(config.prefix),
			storage_class: config.storage_class.as_deref().map(StorageClass::from),
		}
	}

	pub fn bucket(&self) -> &str {
		&self.bucket
	}
}

fn is_not_found<E>(err: &SdkError<E>) -> bool {
	matches!(err, SdkError::ServiceError(e) if e.raw().status().as_u16() == 404)
}

fn map_sdk_error<E>(err: SdkError<E>) -> StoreError
where
	E: std::error::Error + 'static,
{
	StoreError::Backend { message: DisplayErrorContext(err).to_string() }
}

fn parse_meta(content_length: Option<i64>, metadata: Option<&HashMap<String, String>>) -> ObjectMeta {
	let recorded_size =
		metadata.and_then(|m| m.get(META_SIZE)).and_then(|v| v.parse::<u64>().ok());
	let size = content_length.map(|len| len.max(0) as u64).or(recorded_size).unwrap_or(0);
	let mtime = metadata.and_then(|m| m.get(META_MTIME)).and_then(|v| v.parse::<i64>().ok());
	ObjectMeta { size, mtime }
}

#[async_trait]
impl Store for S3Store {
	async fn put(
		&self,
		key: &str,
		body: File,
		size: u64,
		mtime: i64,
		_cancel: &CancellationToken,
	) -> StoreResult<()> {
		let full = self.keys.full_key(key);
		let stream = ByteStream::read_from()
			.file(body)
			.build()
			.await
			.map_err(|e| StoreError::Backend { message: e.to_string() })?;

		let mut request = self
			.client
			.put_object()
			.bucket(&self.bucket)
			.key(&full)
			.body(stream)
			.content_length(size as i64)
			.metadata(META_MTIME, mtime.to_string())
			.metadata(META_SIZE, size.to_string());
		if let Some(class) = &self.storage_class {
			request = request.storage_class(class.clone());
		}

		debug!("[s3] PUT s3://{}/{} ({} bytes)", self.bucket, full, size);
		request.send().await.map_err(map_sdk_error)?;
		Ok(())
	}

	async fn stat(&self, key: &str, _cancel: &CancellationToken) -> StoreResult<Option<ObjectMeta>> {
		let full = self.keys.full_key(key);
		match self.client.head_object().bucket(&self.bucket).key(&full).send().await {
			Ok(out) => Ok(Some(parse_meta(out.content_length(), out.metadata()))),
			Err(err) if is_not_found(&err) => Ok(None),
			Err(err) => Err(map_sdk_error(err)),
		}
	}

	async fn list(&self, cancel: &CancellationToken) -> StoreResult<Vec<String>> {
		let scope = self.keys.scope();
		let mut keys = Vec::new();
		let mut continuation_token: Option<String> = None;

		loop {
			if cancel.is_cancelled() {
				return Err(StoreError::Cancelled);
			}

			let mut request = self.client.list_objects_v2().bucket(&self.bucket);
			if !scope.is_empty() {
				request = request.prefix(&scope);
			}
			if let Some(token) = continuation_token.take() {
				request = request.continuation_token(token);
			}

			let response = request.send().await.map_err(map_sdk_error)?;
			for obj in response.contents() {
				if let Some(full) = obj.key() {
					keys.push(self.keys.rel_key(full));
				}
			}

			if response.is_truncated() == Some(true) {
				continuation_token = response.next_continuation_token().map(|s| s.to_string());
				if continuation_token.is_none() {
					break;
				}
			} else {
				break;
			}
		}

		debug!("[s3] listed {} objects under s3://{}/{}", keys.len(), self.bucket, scope);
		Ok(keys)
	}

	async fn delete(&self, key: &str, _cancel: &CancellationToken) -> StoreResult<()> {
		let full = self.keys.full_key(key);
		debug!("[s3] DELETE s3://{}/{}", self.bucket, full);
		match self.client.delete_object().bucket(&self.bucket).key(&full).send().await {
			Ok(_) => Ok(()),
			Err(err) if is_not_found(&err) => Err(StoreError::NotFound),
			Err(err) => Err(map_sdk_error(err)),
		}
	}
}


// vim: ts=4
