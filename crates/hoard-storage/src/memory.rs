//! In-memory blob store.

use async_trait::async_trait;
use hoard_core::ports::{BlobStore, ObjectVersion, PutCondition, VersionedObject};
use hoard_core::{Error, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Blob store holding every object in process memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, VersionedObject>>,
    generation: AtomicU64,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&self) -> ObjectVersion {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        ObjectVersion::new(format!("v{}", generation))
    }

    /// Sorted list of stored keys.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Raw body of a stored object.
    pub async fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(key).map(|o| o.data.clone())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_file(&self, key: &str, path: &Path, condition: PutCondition) -> Result<()> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            Error::UploadFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;
        self.put_bytes(key, data, condition).await?;
        Ok(())
    }

    async fn put_bytes(
        &self,
        key: &str,
        data: Vec<u8>,
        condition: PutCondition,
    ) -> Result<ObjectVersion> {
        let mut objects = self.objects.write().await;
        condition.check(key, objects.get(key).map(|o| &o.version))?;

        let version = self.next_version();
        objects.insert(
            key.to_string(),
            VersionedObject {
                data,
                version: version.clone(),
            },
        );
        Ok(version)
    }

    async fn get(&self, key: &str) -> Result<Option<VersionedObject>> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn signed_download_url(
        &self,
        key: &str,
        ttl: Duration,
        _download_name: Option<&str>,
    ) -> Result<String> {
        Ok(format!("memory://{}?expires_in={}", key, ttl.as_secs()))
    }
}
