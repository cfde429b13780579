//! Test context providing access to test infrastructure.

use crate::containers::MinioContainer;
use hoard_cache::{
    ArchivePipeline, CacheCoordinator, CodecCompressor, CompressionType, MemoryFastCache,
    SnapshotStore,
};
use hoard_core::ports::BlobStore;
use hoard_storage::S3BlobStore;
use std::sync::Arc;

/// A running MinIO with a fresh bucket.
///
/// Drop this to stop the container.
pub struct TestContext {
    pub minio: MinioContainer,
    pub bucket: String,
    pub blobs: Arc<S3BlobStore>,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        crate::init_test_logging();

        let minio = MinioContainer::start().await?;
        let bucket = format!("hoard-{}", uuid::Uuid::new_v4().simple());
        let blobs = Arc::new(S3BlobStore::new(&minio.s3_config(&bucket)).await?);

        Ok(Self {
            minio,
            bucket,
            blobs,
        })
    }

    /// A coordinator with an empty fast cache over the shared bucket.
    ///
    /// Each call models a fresh process.
    pub fn coordinator(&self) -> CacheCoordinator {
        let blobs: Arc<dyn BlobStore> = self.blobs.clone();
        CacheCoordinator::new(
            Arc::new(MemoryFastCache::new()),
            SnapshotStore::new(blobs.clone()),
            ArchivePipeline::new(
                Arc::new(CodecCompressor::new(CompressionType::Gzip)),
                blobs,
            ),
        )
    }
}
