//! Key-value blob storage.
//!
//! [`BlobStore`] is the raw byte-level contract; [`JsonStore`] layers typed
//! documents and conditional read-modify-write on top of it.

mod memory;
mod s3;

pub use memory::MemoryStore;
pub use s3::S3Store;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::{Error, Result};

/// How many times a conditional update is retried against a fresh read.
pub const MAX_WRITE_ATTEMPTS: usize = 5;

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
    /// Opaque version token (ETag) used for conditional writes
    pub version: String,
}

/// Condition a write must satisfy to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// Key must not exist yet
    Absent,
    /// Key must still be at this version
    Matches(String),
}

/// Strongly consistent single-key blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch a blob, `None` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<Blob>>;

    /// Unconditionally write a blob, returning its new version.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<&str>) -> Result<String>;

    /// Write a blob only if `precondition` holds.
    ///
    /// Returns `Ok(None)` when the precondition failed and nothing was written.
    async fn put_if(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
        precondition: Precondition,
    ) -> Result<Option<String>>;

    /// Delete a key. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;

    /// All keys, in no particular order.
    async fn list(&self) -> Result<Vec<String>>;
}

const JSON_CONTENT_TYPE: &str = "application/json";

/// Typed JSON documents over a blob store namespace.
#[derive(Clone)]
pub struct JsonStore {
    inner: Arc<dyn BlobStore>,
}

impl JsonStore {
    pub fn new(inner: Arc<dyn BlobStore>) -> Self {
        Self { inner }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        Ok(self.get_versioned(key).await?.map(|(value, _)| value))
    }

    async fn get_versioned<T: DeserializeOwned>(&self, key: &str) -> Result<Option<(T, String)>> {
        match self.inner.get(key).await? {
            Some(blob) => Ok(Some((serde_json::from_slice(&blob.data)?, blob.version))),
            None => Ok(None),
        }
    }

    /// Overwrite a document.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.inner
            .put(key, serde_json::to_vec(value)?, Some(JSON_CONTENT_TYPE))
            .await?;
        Ok(())
    }

    /// Write a new document, failing with `Conflict` if the key is taken.
    pub async fn create<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let written = self
            .inner
            .put_if(
                key,
                serde_json::to_vec(value)?,
                Some(JSON_CONTENT_TYPE),
                Precondition::Absent,
            )
            .await?;
        match written {
            Some(_) => Ok(()),
            None => Err(Error::Conflict(format!("{} already exists", key))),
        }
    }

    /// Read-modify-write a document without losing concurrent updates.
    ///
    /// `mutate` runs against the freshest copy; if another writer got in
    /// between the read and the write, the cycle is repeated. Returns the
    /// stored document, or `None` if the key doesn't exist.
    pub async fn update<T, F>(&self, key: &str, mut mutate: F) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnMut(&mut T) + Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let Some((mut value, version)) = self.get_versioned::<T>(key).await? else {
                return Ok(None);
            };
            mutate(&mut value);

            let written = self
                .inner
                .put_if(
                    key,
                    serde_json::to_vec(&value)?,
                    Some(JSON_CONTENT_TYPE),
                    Precondition::Matches(version),
                )
                .await?;
            if written.is_some() {
                return Ok(Some(value));
            }
            warn!("Concurrent write to {} (attempt {}), retrying", key, attempt);
        }

        Err(Error::Conflict(
            "The record was modified concurrently, please retry".to_string(),
        ))
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }

    /// Keys of every document in the namespace.
    pub async fn keys(&self) -> Result<Vec<String>> {
        self.inner.list().await
    }

    /// Every document in the namespace. Keys removed mid-listing are skipped.
    pub async fn list_all<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for key in self.keys().await? {
            if let Some(value) = self.get(&key).await? {
                values.push(value);
            }
        }
        Ok(values)
    }
}
