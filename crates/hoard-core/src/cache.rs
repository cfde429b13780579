//! Cache snapshot document.

use crate::content::{ArtifactRef, ContentKey};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The durable `{content key -> artifact}` mapping.
///
/// Serialized as a single flat JSON object whose keys are content keys and
/// whose values are artifact names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheSnapshot {
    entries: BTreeMap<ContentKey, ArtifactRef>,
}

impl CacheSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ContentKey) -> Option<&ArtifactRef> {
        self.entries.get(key)
    }

    /// Merge a mapping in. Returns the previous artifact when the key was
    /// already present with a different value.
    pub fn insert(&mut self, key: ContentKey, artifact: ArtifactRef) -> Option<ArtifactRef> {
        match self.entries.insert(key, artifact.clone()) {
            Some(previous) if previous != artifact => Some(previous),
            _ => None,
        }
    }

    pub fn contains(&self, key: &ContentKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ContentKey, &ArtifactRef)> {
        self.entries.iter()
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

impl FromIterator<(ContentKey, ArtifactRef)> for CacheSnapshot {
    fn from_iter<I: IntoIterator<Item = (ContentKey, ArtifactRef)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
