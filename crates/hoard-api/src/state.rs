//! Application state shared across handlers.

use hoard_cache::CacheCoordinator;
use hoard_core::ports::BlobStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<CacheCoordinator>,
    pub blobs: Arc<dyn BlobStore>,
    /// Directory uploads are staged in before fingerprinting.
    pub upload_dir: PathBuf,
    /// Lifetime of issued download links.
    pub link_ttl: Duration,
}

impl AppState {
    pub fn new(
        coordinator: Arc<CacheCoordinator>,
        blobs: Arc<dyn BlobStore>,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            coordinator,
            blobs,
            upload_dir: upload_dir.into(),
            link_ttl: Duration::from_secs(3600),
        }
    }

    pub fn with_link_ttl(mut self, ttl: Duration) -> Self {
        self.link_ttl = ttl;
        self
    }
}
