//! Lookup-or-populate across the fast cache and the durable snapshot.
//!
//! Resolution order for a content key:
//!
//! 1. fast cache;
//! 2. on a miss, rebuild the fast cache from the snapshot and look again;
//! 3. on a second miss, run the archive pipeline and commit the new mapping
//!    to the fast cache and then to the snapshot.
//!
//! Archived objects are create-only. A novel upload whose name is already
//! taken is stored under a numbered variant of the name, so an existing
//! content key never starts serving someone else's bytes.
//!
//! Concurrent requests are not serialised. Two requests for the same novel
//! content may both archive it; the loser of the upload race lands under a
//! numbered name holding the same bytes, and the last snapshot commit wins.
//! A rebuild racing a direct `put` can drop that entry from the fast cache
//! until the next rebuild, which only costs another snapshot read.

use crate::archiver::ArchivePipeline;
use crate::metrics::CacheMetrics;
use crate::snapshot::SnapshotStore;
use crate::types::{CacheStats, Resolution, ResolutionSource};
use hoard_core::ports::FastCache;
use hoard_core::{ContentKey, Error, Result, StagedFile};
use hoard_trace::{reconcile_span, resolve_span};
use std::sync::Arc;
use tracing::{Instrument, debug, info, warn};

/// Coordinates the two cache tiers and the archive pipeline.
pub struct CacheCoordinator {
    fast: Arc<dyn FastCache>,
    snapshots: SnapshotStore,
    pipeline: ArchivePipeline,
    metrics: CacheMetrics,
}

impl CacheCoordinator {
    pub fn new(fast: Arc<dyn FastCache>, snapshots: SnapshotStore, pipeline: ArchivePipeline) -> Self {
        Self {
            fast,
            snapshots,
            pipeline,
            metrics: CacheMetrics::new(),
        }
    }

    pub fn pipeline(&self) -> &ArchivePipeline {
        &self.pipeline
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Resolve a content key to its artifact, archiving the source on a total miss.
    pub async fn resolve_or_archive(&self, key: &ContentKey, source: &StagedFile) -> Result<Resolution> {
        self.resolve_inner(key, source)
            .instrument(resolve_span(key.as_str()))
            .await
    }

    async fn resolve_inner(&self, key: &ContentKey, source: &StagedFile) -> Result<Resolution> {
        if let Some(artifact) = self.fast.get(key) {
            self.metrics.record_fast_hit();
            debug!(key = %key, artifact = %artifact, "Fast cache hit");
            return Ok(Resolution {
                artifact,
                source: ResolutionSource::FastCache,
            });
        }

        if self.reconcile().await?.is_some() {
            if let Some(artifact) = self.fast.get(key) {
                self.metrics.record_snapshot_hit();
                info!(key = %key, artifact = %artifact, "Resolved from snapshot");
                return Ok(Resolution {
                    artifact,
                    source: ResolutionSource::Snapshot,
                });
            }
        }

        self.metrics.record_miss();
        info!(key = %key, artifact = %source.name, "Cache miss, archiving");

        let archived = match self.pipeline.archive(source).await {
            Ok(archived) => archived,
            Err(e) => {
                self.metrics.record_archive_failure();
                warn!(key = %key, artifact = %source.name, error = %e, "Archive failed");
                return Err(e);
            }
        };
        self.metrics.record_archive();

        self.fast.put(key.clone(), archived.artifact.clone());
        match self.snapshots.commit(key, &archived.artifact).await {
            Ok(outcome) => {
                for _ in 0..outcome.conflicts {
                    self.metrics.record_commit_conflict();
                }
            }
            Err(e) => {
                // the fast tier must never hold a mapping the snapshot lacks
                self.fast.remove(key);
                if matches!(e, Error::Conflict { .. }) {
                    self.metrics.record_commit_conflict();
                }
                warn!(key = %key, error = %e, "Snapshot commit failed");
                return Err(e);
            }
        }

        Ok(Resolution {
            artifact: archived.artifact,
            source: ResolutionSource::Archived,
        })
    }

    /// Rebuild the fast cache from the durable snapshot.
    ///
    /// Returns the number of entries loaded, or `None` when no snapshot exists,
    /// in which case the fast cache is left untouched.
    pub async fn reconcile(&self) -> Result<Option<usize>> {
        self.metrics.record_reconciliation();
        let loaded = self.snapshots.load().instrument(reconcile_span()).await?;
        let Some(snapshot) = loaded else {
            return Ok(None);
        };

        self.fast.clear();
        self.fast.put_all(&snapshot);
        debug!(entries = snapshot.len(), "Rebuilt fast cache from snapshot");
        Ok(Some(snapshot.len()))
    }

    /// Drop every fast cache entry.
    pub fn flush(&self) {
        self.fast.clear();
        info!("Flushed fast cache");
    }

    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot(self.fast.len())
    }
}
