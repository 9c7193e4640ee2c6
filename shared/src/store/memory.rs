//! In-process blob store, used by tests and local runs.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::{Blob, BlobStore, Precondition};
use crate::Result;

#[derive(Default)]
pub struct MemoryStore {
    blobs: RwLock<BTreeMap<String, Blob>>,
    next_version: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&self) -> String {
        (self.next_version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Blob>> {
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: Option<&str>) -> Result<String> {
        let version = self.bump();
        self.blobs.write().await.insert(
            key.to_string(),
            Blob {
                data,
                content_type: content_type.map(str::to_string),
                version: version.clone(),
            },
        );
        Ok(version)
    }

    async fn put_if(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
        precondition: Precondition,
    ) -> Result<Option<String>> {
        // Hold the write lock across check and insert.
        let mut blobs = self.blobs.write().await;
        let current = blobs.get(key).map(|b| b.version.as_str());
        let holds = match (&precondition, current) {
            (Precondition::Absent, None) => true,
            (Precondition::Matches(expected), Some(actual)) => expected == actual,
            _ => false,
        };
        if !holds {
            return Ok(None);
        }

        let version = self.bump();
        blobs.insert(
            key.to_string(),
            Blob {
                data,
                content_type: content_type.map(str::to_string),
                version: version.clone(),
            },
        );
        Ok(Some(version))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.blobs.write().await.remove(key);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.blobs.read().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_conditional_writes() {
        let store = MemoryStore::new();
        let v1 = store
            .put_if("k", b"one".to_vec(), None, Precondition::Absent)
            .await
            .unwrap()
            .unwrap();
        assert!(store
            .put_if("k", b"again".to_vec(), None, Precondition::Absent)
            .await
            .unwrap()
            .is_none());

        let v2 = store
            .put_if("k", b"two".to_vec(), None, Precondition::Matches(v1.clone()))
            .await
            .unwrap()
            .unwrap();
        assert_ne!(v1, v2);
        assert!(store
            .put_if("k", b"stale".to_vec(), None, Precondition::Matches(v1))
            .await
            .unwrap()
            .is_none());

        assert_eq!(store.get("k").await.unwrap().unwrap().data, b"two");
    }
}
