//! S3-backed blob store.
//!
//! Each store is one namespace (`events`, `banners`, ...) under a key prefix
//! in a shared bucket. Conditional writes map onto S3's `If-Match` /
//! `If-None-Match` headers, with the object ETag as the version.

use async_trait::async_trait;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;

use super::{Blob, BlobStore, Precondition};
use crate::{Error, Result};

pub struct S3Store {
    client: S3Client,
    bucket: String,
    prefix: String,
}

impl S3Store {
    /// Store for `namespace` under `base_prefix` (which may be empty).
    pub fn new(
        client: S3Client,
        bucket: impl Into<String>,
        base_prefix: &str,
        namespace: &str,
    ) -> Self {
        let base = base_prefix.trim_matches('/');
        let prefix = if base.is_empty() {
            format!("{}/", namespace)
        } else {
            format!("{}/{}/", base, namespace)
        };
        Self {
            client,
            bucket: bucket.into(),
            prefix,
        }
    }

    fn object_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

fn is_precondition_failure<E: ProvideErrorMetadata>(err: &E) -> bool {
    matches!(
        err.code(),
        Some("PreconditionFailed") | Some("ConditionalRequestConflict")
    )
}

#[async_trait]
impl BlobStore for S3Store {
    async fn get(&self, key: &str) -> Result<Option<Blob>> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let service_error = err.into_service_error();
                if service_error.is_no_such_key() {
                    return Ok(None);
                }
                return Err(Error::Store(format!("Failed to get {}: {}", key, service_error)));
            }
        };

        let version = output.e_tag().unwrap_or_default().to_string();
        let content_type = output.content_type().map(str::to_string);
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| Error::Store(format!("Failed to read {}: {}", key, e)))?
            .into_bytes()
            .to_vec();

        Ok(Some(Blob {
            data,
            content_type,
            version,
        }))
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<&str>) -> Result<String> {
        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .body(ByteStream::from(data))
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(|e| {
                Error::Store(format!("Failed to put {}: {}", key, e.into_service_error()))
            })?;

        Ok(output.e_tag().unwrap_or_default().to_string())
    }

    async fn put_if(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
        precondition: Precondition,
    ) -> Result<Option<String>> {
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .body(ByteStream::from(data))
            .set_content_type(content_type.map(str::to_string));
        let request = match precondition {
            Precondition::Absent => request.if_none_match("*"),
            Precondition::Matches(etag) => request.if_match(etag),
        };

        match request.send().await {
            Ok(output) => Ok(Some(output.e_tag().unwrap_or_default().to_string())),
            Err(err) if is_precondition_failure(&err) => Ok(None),
            Err(err) => Err(Error::Store(format!(
                "Failed to put {}: {}",
                key,
                err.into_service_error()
            ))),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .send()
            .await
            .map_err(|e| {
                Error::Store(format!("Failed to delete {}: {}", key, e.into_service_error()))
            })?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&self.prefix)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page
                .map_err(|e| Error::Store(format!("Failed to list {}: {}", self.prefix, e)))?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter_map(|key| key.strip_prefix(self.prefix.as_str()))
                    .filter(|key| !key.is_empty())
                    .map(str::to_string),
            );
        }

        Ok(keys)
    }
}
