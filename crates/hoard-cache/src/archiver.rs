//! Compress-then-upload pipeline for novel content.

use hoard_core::ports::{BlobStore, Compressor, PutCondition};
use hoard_core::{ArtifactRef, Error, Result, StagedFile};
use hoard_trace::archive_span;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Instrument, debug, info, warn};

/// Alternative names tried when an artifact name is already taken.
const MAX_NAME_ATTEMPTS: u32 = 100;

/// A local file that is removed when the guard goes out of scope.
///
/// Removal is best-effort; failures are logged.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed local file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove local file"),
        }
    }
}

/// Result of a successful archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedArtifact {
    pub artifact: ArtifactRef,
    pub object_key: String,
}

/// Compresses a staged file and uploads the result to blob storage.
pub struct ArchivePipeline {
    compressor: Arc<dyn Compressor>,
    blobs: Arc<dyn BlobStore>,
    remove_source: bool,
}

impl ArchivePipeline {
    pub fn new(compressor: Arc<dyn Compressor>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            compressor,
            blobs,
            remove_source: false,
        }
    }

    /// Also delete the staged source file once the upload attempt is over.
    pub fn with_remove_source(mut self, remove: bool) -> Self {
        self.remove_source = remove;
        self
    }

    /// Durable object key of an artifact: `<name>.<extension>`.
    pub fn object_key(&self, artifact: &ArtifactRef) -> String {
        artifact.object_key(self.compressor.extension())
    }

    /// Compress and upload.
    ///
    /// Compression failure stops the pipeline before any upload. The
    /// compressed file is removed on every exit path.
    ///
    /// Archived objects are never overwritten. When `<name>.<ext>` already
    /// exists the artifact is stored as `<name> (1).<ext>`, `<name> (2).<ext>`
    /// and so on; the returned artifact carries the name actually used.
    pub async fn archive(&self, source: &StagedFile) -> Result<ArchivedArtifact> {
        let object_key = self.object_key(&source.name);
        let span = archive_span(source.name.as_str(), &object_key);
        self.archive_inner(source).instrument(span).await
    }

    async fn archive_inner(&self, source: &StagedFile) -> Result<ArchivedArtifact> {
        let _source_guard = self.remove_source.then(|| TempArtifact::new(source.path()));

        let compressed = TempArtifact::new(self.compressor.compress(source.path()).await?);

        let mut artifact = source.name.clone();
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let object_key = self.object_key(&artifact);
            match self
                .blobs
                .put_file(&object_key, compressed.path(), PutCondition::IfAbsent)
                .await
            {
                Ok(()) => {
                    info!(artifact = %artifact, object_key = %object_key, "Archived artifact");
                    return Ok(ArchivedArtifact {
                        artifact,
                        object_key,
                    });
                }
                Err(Error::Conflict { .. }) => {
                    debug!(object_key = %object_key, "Object key taken, trying another name");
                    artifact = source.name.with_suffix(attempt);
                }
                Err(e @ Error::UploadFailed(_)) => return Err(e),
                Err(other) => return Err(Error::UploadFailed(other.to_string())),
            }
        }

        Err(Error::UploadFailed(format!(
            "no free object key for {} after {} attempts",
            source.name, MAX_NAME_ATTEMPTS
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::{CodecCompressor, decompress};
    use crate::types::CompressionType;
    use hoard_storage::MemoryBlobStore;

    async fn staged(dir: &Path, name: &str, data: &[u8]) -> StagedFile {
        let path = dir.join(name);
        tokio::fs::write(&path, data).await.unwrap();
        StagedFile::new(path, ArtifactRef::new(name).unwrap())
    }

    #[tokio::test]
    async fn test_archive_uploads_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let source = staged(dir.path(), "A", b"hello").await;
        let blobs = Arc::new(MemoryBlobStore::new());
        let pipeline = ArchivePipeline::new(
            Arc::new(CodecCompressor::new(CompressionType::Zstd)),
            blobs.clone(),
        );

        let archived = pipeline.archive(&source).await.unwrap();

        assert_eq!(archived.object_key, "A.zst");
        let stored = blobs.object("A.zst").await.unwrap();
        assert_eq!(decompress(&stored, CompressionType::Zstd).unwrap(), b"hello");
        assert!(!dir.path().join("A.zst").exists());
        assert!(source.path().exists());
    }

    #[tokio::test]
    async fn test_remove_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = staged(dir.path(), "A", b"hello").await;
        let pipeline = ArchivePipeline::new(
            Arc::new(CodecCompressor::new(CompressionType::Gzip)),
            Arc::new(MemoryBlobStore::new()),
        )
        .with_remove_source(true);

        pipeline.archive(&source).await.unwrap();
        assert!(!source.path().exists());
    }

    #[tokio::test]
    async fn test_compression_failure_skips_upload() {
        let dir = tempfile::tempdir().unwrap();
        let source = StagedFile::new(dir.path().join("gone"), ArtifactRef::new("gone").unwrap());
        let blobs = Arc::new(MemoryBlobStore::new());
        let pipeline = ArchivePipeline::new(
            Arc::new(CodecCompressor::new(CompressionType::Zstd)),
            blobs.clone(),
        );

        let err = pipeline.archive(&source).await.unwrap_err();
        assert!(matches!(err, Error::CompressionFailed(_)));
        assert!(blobs.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_taken_name_gets_suffix() {
        let first_dir = tempfile::tempdir().unwrap();
        let second_dir = tempfile::tempdir().unwrap();
        let blobs = Arc::new(MemoryBlobStore::new());
        let pipeline = ArchivePipeline::new(
            Arc::new(CodecCompressor::new(CompressionType::Zstd)),
            blobs.clone(),
        );

        let first = pipeline
            .archive(&staged(first_dir.path(), "notes.txt", b"hello").await)
            .await
            .unwrap();
        let second = pipeline
            .archive(&staged(second_dir.path(), "notes.txt", b"world").await)
            .await
            .unwrap();

        assert_eq!(first.object_key, "notes.txt.zst");
        assert_eq!(second.artifact.as_str(), "notes (1).txt");
        assert_eq!(second.object_key, "notes (1).txt.zst");

        let kept = blobs.object("notes.txt.zst").await.unwrap();
        assert_eq!(decompress(&kept, CompressionType::Zstd).unwrap(), b"hello");
        let renamed = blobs.object("notes (1).txt.zst").await.unwrap();
        assert_eq!(decompress(&renamed, CompressionType::Zstd).unwrap(), b"world");
    }

    #[test]
    fn test_temp_artifact_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        drop(TempArtifact::new(dir.path().join("never-created")));
    }
}
