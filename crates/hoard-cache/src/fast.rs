//! In-memory fast cache.

use dashmap::DashMap;
use hoard_core::ports::FastCache;
use hoard_core::{ArtifactRef, CacheSnapshot, ContentKey};

/// Fast cache backed by a concurrent hash map.
///
/// Unbounded; entries live until `clear` or process exit.
#[derive(Debug, Default)]
pub struct MemoryFastCache {
    entries: DashMap<ContentKey, ArtifactRef>,
}

impl MemoryFastCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FastCache for MemoryFastCache {
    fn get(&self, key: &ContentKey) -> Option<ArtifactRef> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn put(&self, key: ContentKey, artifact: ArtifactRef) {
        self.entries.insert(key, artifact);
    }

    fn remove(&self, key: &ContentKey) {
        self.entries.remove(key);
    }

    fn clear(&self) {
        self.entries.clear();
    }

    fn put_all(&self, snapshot: &CacheSnapshot) {
        for (key, artifact) in snapshot.iter() {
            self.entries.insert(key.clone(), artifact.clone());
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
