//! Durable snapshot store.
//!
//! The whole `{content key -> artifact}` mapping lives in one JSON document in
//! the blob store. Reads return the document version so that commits can be
//! made conditional on nobody having written in between.

use hoard_core::ports::{BlobStore, ObjectVersion, PutCondition};
use hoard_core::{ArtifactRef, CacheSnapshot, ContentKey, Error, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default object key of the snapshot document.
pub const DEFAULT_SNAPSHOT_KEY: &str = "text.json";

const DEFAULT_MAX_COMMIT_ATTEMPTS: u32 = 5;

/// Outcome of a successful commit.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub snapshot: CacheSnapshot,
    pub version: ObjectVersion,
    /// Conditional writes that lost a race before this one won.
    pub conflicts: u32,
}

/// Reads and writes the snapshot document.
#[derive(Clone)]
pub struct SnapshotStore {
    blobs: Arc<dyn BlobStore>,
    key: String,
    max_commit_attempts: u32,
}

impl SnapshotStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            blobs,
            key: DEFAULT_SNAPSHOT_KEY.to_string(),
            max_commit_attempts: DEFAULT_MAX_COMMIT_ATTEMPTS,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_max_commit_attempts(mut self, attempts: u32) -> Self {
        self.max_commit_attempts = attempts.max(1);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Fetch the snapshot. `Ok(None)` if it has never been written.
    pub async fn load(&self) -> Result<Option<CacheSnapshot>> {
        Ok(self.load_versioned().await?.map(|(snapshot, _)| snapshot))
    }

    /// Fetch the snapshot together with its current version.
    pub async fn load_versioned(&self) -> Result<Option<(CacheSnapshot, ObjectVersion)>> {
        let Some(object) = self.blobs.get(&self.key).await? else {
            debug!(key = %self.key, "No snapshot document yet");
            return Ok(None);
        };

        let snapshot = CacheSnapshot::from_json(&object.data)?;
        debug!(key = %self.key, entries = snapshot.len(), version = %object.version, "Loaded snapshot");
        Ok(Some((snapshot, object.version)))
    }

    /// Overwrite the document in full.
    pub async fn save(&self, snapshot: &CacheSnapshot) -> Result<ObjectVersion> {
        let version = self
            .blobs
            .put_bytes(&self.key, snapshot.to_json()?, PutCondition::None)
            .await?;
        info!(key = %self.key, entries = snapshot.len(), "Saved snapshot");
        Ok(version)
    }

    /// Merge one mapping into the durable document.
    ///
    /// Read-merge-write where the write only succeeds if the document is still
    /// at the version that was read (or still absent). A lost race re-reads
    /// and merges again; after `max_commit_attempts` lost races the commit
    /// fails with [`Error::Conflict`]. Other store errors are returned as-is.
    /// A mapping that is already present is not written again.
    pub async fn commit(&self, key: &ContentKey, artifact: &ArtifactRef) -> Result<CommitOutcome> {
        let mut conflicts = 0;

        loop {
            let (mut snapshot, condition) = match self.load_versioned().await? {
                Some((snapshot, version)) if snapshot.get(key) == Some(artifact) => {
                    debug!(key = %key, "Mapping already committed");
                    return Ok(CommitOutcome {
                        snapshot,
                        version,
                        conflicts,
                    });
                }
                Some((snapshot, version)) => (snapshot, PutCondition::IfMatch(version)),
                None => (CacheSnapshot::new(), PutCondition::IfAbsent),
            };

            if let Some(previous) = snapshot.insert(key.clone(), artifact.clone()) {
                warn!(
                    key = %key,
                    previous = %previous,
                    artifact = %artifact,
                    "Reassigning content key to a different artifact"
                );
            }

            match self
                .blobs
                .put_bytes(&self.key, snapshot.to_json()?, condition)
                .await
            {
                Ok(version) => {
                    debug!(key = %key, entries = snapshot.len(), conflicts, "Committed mapping");
                    return Ok(CommitOutcome {
                        snapshot,
                        version,
                        conflicts,
                    });
                }
                Err(Error::Conflict { reason, .. }) => {
                    conflicts += 1;
                    warn!(key = %key, attempt = conflicts, reason = %reason, "Snapshot changed during commit");
                    if conflicts >= self.max_commit_attempts {
                        return Err(Error::Conflict {
                            key: self.key.clone(),
                            reason: format!(
                                "gave up merging {} after {} concurrent updates",
                                key, conflicts
                            ),
                        });
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}
