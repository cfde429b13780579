//! Wiring of storage, compression and the cache coordinator.

use anyhow::{Context, Result};
use hoard_cache::{
    ArchivePipeline, CacheCoordinator, CodecCompressor, CompressionType, MemoryFastCache,
    SnapshotStore,
};
use hoard_core::ports::{BlobStore, Compressor};
use hoard_storage::{FilesystemBlobStore, MemoryBlobStore, S3BlobStore};
use std::sync::Arc;
use tracing::info;

use crate::config::{CompressionConfig, HoardConfig, StorageConfig};

/// Long-lived services shared by the commands.
pub struct Services {
    pub blobs: Arc<dyn BlobStore>,
    pub coordinator: Arc<CacheCoordinator>,
}

pub async fn build_blob_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match config {
        StorageConfig::S3(s3) => Arc::new(
            S3BlobStore::new(s3)
                .await
                .context("Failed to initialize S3 storage")?,
        ),
        StorageConfig::Filesystem { root } => Arc::new(FilesystemBlobStore::new(root)),
        StorageConfig::Memory => Arc::new(MemoryBlobStore::new()),
    };
    Ok(store)
}

pub fn build_compressor(config: &CompressionConfig) -> Arc<dyn Compressor> {
    match config {
        CompressionConfig::Shell(shell) => Arc::new(shell.clone()),
        CompressionConfig::Zstd => Arc::new(CodecCompressor::new(CompressionType::Zstd)),
        CompressionConfig::Gzip => Arc::new(CodecCompressor::new(CompressionType::Gzip)),
        CompressionConfig::Lz4 => Arc::new(CodecCompressor::new(CompressionType::Lz4)),
    }
}

pub async fn build(config: &HoardConfig) -> Result<Services> {
    let blobs = build_blob_store(&config.storage).await?;
    let compressor = build_compressor(&config.compression);
    let extension = compressor.extension().to_string();

    let snapshots = SnapshotStore::new(blobs.clone())
        .with_key(config.snapshot_key.clone())
        .with_max_commit_attempts(config.max_commit_attempts);
    let pipeline = ArchivePipeline::new(compressor, blobs.clone())
        .with_remove_source(config.remove_source);
    let coordinator = CacheCoordinator::new(Arc::new(MemoryFastCache::new()), snapshots, pipeline);

    info!(snapshot_key = %config.snapshot_key, extension = %extension, "Cache coordinator ready");

    Ok(Services {
        blobs,
        coordinator: Arc::new(coordinator),
    })
}
