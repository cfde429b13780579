//! Port traits (hexagonal architecture).
//!
//! These traits define the interfaces between the cache core and external adapters.

use crate::cache::CacheSnapshot;
use crate::content::{ArtifactRef, ContentKey};
use crate::{Error, Result};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Opaque version token of a stored object (an ETag on S3).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectVersion(String);

impl ObjectVersion {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Precondition attached to a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutCondition {
    /// Unconditional overwrite.
    None,
    /// Only create; fail if the object already exists.
    IfAbsent,
    /// Only replace the object if it is still at this version.
    IfMatch(ObjectVersion),
}

impl PutCondition {
    /// Evaluate the precondition against the current version of `key`.
    pub fn check(&self, key: &str, current: Option<&ObjectVersion>) -> Result<()> {
        let reason = match (self, current) {
            (PutCondition::IfAbsent, Some(_)) => "object already exists".to_string(),
            (PutCondition::IfMatch(expected), Some(actual)) if expected != actual => {
                format!("expected version {}, found {}", expected, actual)
            }
            (PutCondition::IfMatch(expected), None) => {
                format!("expected version {}, object is gone", expected)
            }
            _ => return Ok(()),
        };
        Err(Error::Conflict {
            key: key.to_string(),
            reason,
        })
    }
}

/// An object body together with its version.
#[derive(Debug, Clone)]
pub struct VersionedObject {
    pub data: Vec<u8>,
    pub version: ObjectVersion,
}

/// Durable blob storage.
///
/// A store is bound to one bucket (or root) at construction.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stream a local file into the store, honouring the precondition.
    ///
    /// A failed precondition is reported as [`crate::Error::Conflict`]; any
    /// other failure as [`crate::Error::UploadFailed`].
    async fn put_file(&self, key: &str, path: &Path, condition: PutCondition) -> Result<()>;

    /// Write a small object, honouring the precondition.
    ///
    /// A failed precondition is reported as [`crate::Error::Conflict`].
    async fn put_bytes(
        &self,
        key: &str,
        data: Vec<u8>,
        condition: PutCondition,
    ) -> Result<ObjectVersion>;

    /// Fetch an object. `Ok(None)` when it does not exist.
    async fn get(&self, key: &str) -> Result<Option<VersionedObject>>;

    /// Check if a key exists.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Mint a time-limited download link for an object.
    async fn signed_download_url(
        &self,
        key: &str,
        ttl: Duration,
        download_name: Option<&str>,
    ) -> Result<String>;
}

/// Volatile in-process mirror of the snapshot.
///
/// Operations are synchronous and infallible.
pub trait FastCache: Send + Sync {
    fn get(&self, key: &ContentKey) -> Option<ArtifactRef>;

    fn put(&self, key: ContentKey, artifact: ArtifactRef);

    /// Drop a single entry.
    fn remove(&self, key: &ContentKey);

    /// Drop all entries.
    fn clear(&self);

    /// Bulk load, used when rebuilding from the snapshot.
    fn put_all(&self, snapshot: &CacheSnapshot);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Produces a compressed copy of a local file.
#[async_trait]
pub trait Compressor: Send + Sync {
    /// Extension appended to compressed files, without the leading dot.
    fn extension(&self) -> &str;

    /// Compress `source` into `<source>.<extension>` and return that path.
    ///
    /// Failure is reported as [`crate::Error::CompressionFailed`]; on failure
    /// no usable output file is left behind.
    async fn compress(&self, source: &Path) -> Result<PathBuf>;
}

/// Path a compressor writes its output to.
pub fn compressed_path(source: &Path, extension: &str) -> PathBuf {
    let mut os = source.as_os_str().to_os_string();
    os.push(".");
    os.push(extension);
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_condition_check() {
        let v1 = ObjectVersion::new("v1");
        let v2 = ObjectVersion::new("v2");

        assert!(PutCondition::None.check("k", Some(&v1)).is_ok());
        assert!(PutCondition::IfAbsent.check("k", None).is_ok());
        assert!(matches!(
            PutCondition::IfAbsent.check("k", Some(&v1)),
            Err(Error::Conflict { .. })
        ));
        assert!(PutCondition::IfMatch(v1.clone()).check("k", Some(&v1)).is_ok());
        assert!(PutCondition::IfMatch(v1.clone()).check("k", Some(&v2)).is_err());
        assert!(PutCondition::IfMatch(v1).check("k", None).is_err());
    }

    #[test]
    fn test_compressed_path_appends_extension() {
        assert_eq!(
            compressed_path(Path::new("uploads/report.tar"), "bz2"),
            PathBuf::from("uploads/report.tar.bz2")
        );
    }
}
