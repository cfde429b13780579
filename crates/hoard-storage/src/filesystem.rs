//! Filesystem-based blob store for local development.

use async_trait::async_trait;
use hoard_core::ports::{BlobStore, ObjectVersion, PutCondition, VersionedObject};
use hoard_core::{Error, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Stores each object as a file under a root directory.
///
/// Object versions are the SHA-256 of the object body.
pub struct FilesystemBlobStore {
    root_dir: PathBuf,
    write_lock: Mutex<()>,
    tmp_counter: AtomicU64,
}

impl FilesystemBlobStore {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            write_lock: Mutex::new(()),
            tmp_counter: AtomicU64::new(0),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let sanitized_key = key.replace(['/', '\\', ':'], "_");
        self.root_dir.join(sanitized_key)
    }

    fn tmp_path(&self, key: &str) -> PathBuf {
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let sanitized_key = key.replace(['/', '\\', ':'], "_");
        self.root_dir
            .join(format!(".{}.{}.{}.tmp", sanitized_key, std::process::id(), n))
    }

    async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root_dir)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create store dir: {}", e)))
    }

    async fn read_object(&self, key: &str) -> Result<Option<VersionedObject>> {
        match tokio::fs::read(self.key_path(key)).await {
            Ok(data) => {
                let version = version_of(&data);
                Ok(Some(VersionedObject { data, version }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!("Failed to read {}: {}", key, e))),
        }
    }

    /// Fail with a conflict unless `condition` holds for the stored object.
    async fn check_condition(&self, key: &str, condition: &PutCondition) -> Result<()> {
        if *condition == PutCondition::None {
            return Ok(());
        }
        let current = self.read_object(key).await?.map(|o| o.version);
        condition.check(key, current.as_ref())
    }

    /// Write through a temporary file so readers never observe a partial object.
    async fn replace(&self, key: &str, data: &[u8]) -> Result<()> {
        let tmp = self.tmp_path(key);
        let result = async {
            tokio::fs::write(&tmp, data)
                .await
                .map_err(|e| Error::Storage(format!("Failed to write {}: {}", key, e)))?;
            tokio::fs::rename(&tmp, self.key_path(key))
                .await
                .map_err(|e| Error::Storage(format!("Failed to commit {}: {}", key, e)))
        }
        .await;
        if result.is_err() {
            discard(&tmp).await;
        }
        result
    }

    async fn store_file(
        &self,
        key: &str,
        path: &Path,
        tmp: &Path,
        condition: &PutCondition,
    ) -> Result<()> {
        tokio::fs::copy(path, tmp)
            .await
            .map_err(|e| Error::UploadFailed(format!("Failed to copy {}: {}", path.display(), e)))?;

        let _guard = self.write_lock.lock().await;
        self.check_condition(key, condition).await?;
        tokio::fs::rename(tmp, self.key_path(key))
            .await
            .map_err(|e| Error::UploadFailed(format!("Failed to commit {}: {}", key, e)))
    }
}

/// Remove a leftover temporary file.
async fn discard(tmp: &Path) {
    match tokio::fs::remove_file(tmp).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %tmp.display(), error = %e, "Failed to remove temp file"),
    }
}

fn version_of(data: &[u8]) -> ObjectVersion {
    ObjectVersion::new(hex::encode(Sha256::digest(data)))
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put_file(&self, key: &str, path: &Path, condition: PutCondition) -> Result<()> {
        self.ensure_root().await?;
        let tmp = self.tmp_path(key);
        if let Err(e) = self.store_file(key, path, &tmp, &condition).await {
            discard(&tmp).await;
            return Err(e);
        }
        debug!(key = %key, root = %self.root_dir.display(), "Stored file");
        Ok(())
    }

    async fn put_bytes(
        &self,
        key: &str,
        data: Vec<u8>,
        condition: PutCondition,
    ) -> Result<ObjectVersion> {
        self.ensure_root().await?;
        let _guard = self.write_lock.lock().await;

        self.check_condition(key, &condition).await?;
        self.replace(key, &data).await?;
        Ok(version_of(&data))
    }

    async fn get(&self, key: &str) -> Result<Option<VersionedObject>> {
        self.read_object(key).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.key_path(key).exists())
    }

    async fn signed_download_url(
        &self,
        key: &str,
        _ttl: Duration,
        _download_name: Option<&str>,
    ) -> Result<String> {
        let path = self.key_path(key);
        let absolute = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()?.join(path)
        };
        Ok(format!("file://{}", absolute.display()))
    }
}

impl Default for FilesystemBlobStore {
    fn default() -> Self {
        Self::new(PathBuf::from("/var/hoard/blobs"))
    }
}
