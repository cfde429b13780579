//! Cache types and results.

use hoard_core::ArtifactRef;
use serde::{Deserialize, Serialize};

/// In-process compression codec.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    #[default]
    Zstd,
    Gzip,
    Lz4,
}

impl CompressionType {
    /// File extension of the compressed output.
    pub fn extension(&self) -> &'static str {
        match self {
            CompressionType::Zstd => "zst",
            CompressionType::Gzip => "gz",
            CompressionType::Lz4 => "lz4",
        }
    }
}

/// Which tier answered a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Found in the fast cache.
    FastCache,
    /// Found after rebuilding the fast cache from the snapshot.
    Snapshot,
    /// Novel content; archived and committed by this call.
    Archived,
}

/// Result of resolving a content key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub artifact: ArtifactRef,
    pub source: ResolutionSource,
}

impl Resolution {
    pub fn is_hit(&self) -> bool {
        self.source != ResolutionSource::Archived
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub fast_hits: u64,
    pub snapshot_hits: u64,
    pub misses: u64,
    pub reconciliations: u64,
    pub archives: u64,
    pub archive_failures: u64,
    pub commit_conflicts: u64,
    pub fast_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions() {
        assert_eq!(CompressionType::Zstd.extension(), "zst");
        assert_eq!(CompressionType::Gzip.extension(), "gz");
        assert_eq!(CompressionType::Lz4.extension(), "lz4");
    }

    #[test]
    fn test_compression_type_names() {
        let parsed: CompressionType = serde_json::from_str("\"gzip\"").unwrap();
        assert_eq!(parsed, CompressionType::Gzip);
    }
}
