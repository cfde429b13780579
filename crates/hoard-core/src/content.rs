//! Strongly-typed identifiers for uploaded content and archived artifacts.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Hex digest of a file's full byte content.
///
/// Byte-identical files always map to the same key, whatever their name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentKey(String);

impl ContentKey {
    /// Build a key from raw digest bytes.
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// Parse a key supplied as text. Hex digits only, case-folded to lowercase.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidContentKey("empty key".to_string()));
        }
        if trimmed.len() % 2 != 0 || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidContentKey(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ContentKey {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentKey {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<ContentKey> for String {
    fn from(key: ContentKey) -> Self {
        key.0
    }
}

/// Logical name of an archived file.
///
/// The durable object key is `<name>.<compressed extension>`, so the name is
/// restricted to a single path component. Quotes are rejected as the name
/// also ends up in download headers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name == "." || name == ".." {
            return Err(Error::InvalidArtifactName(name));
        }
        if name.contains(['/', '\\', '"', '\0']) || name.chars().any(char::is_control) {
            return Err(Error::InvalidArtifactName(name));
        }
        Ok(Self(name))
    }

    /// Derive an artifact name from a client-supplied file name.
    ///
    /// Directory components are dropped and characters that cannot appear in
    /// an object key segment are replaced.
    pub fn from_upload_name(raw: &str) -> Result<Self> {
        let last = raw
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(raw)
            .trim();
        let sanitized: String = last
            .chars()
            .map(|c| match c {
                ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        Self::new(sanitized)
    }

    /// The `n`th alternative to this name, used when the name is taken.
    ///
    /// The counter goes before the last extension: `report.pdf` becomes
    /// `report (1).pdf`.
    pub fn with_suffix(&self, n: u32) -> Self {
        let name = match self.0.rfind('.') {
            Some(dot) if dot > 0 => format!("{} ({}){}", &self.0[..dot], n, &self.0[dot..]),
            _ => format!("{} ({})", self.0, n),
        };
        Self(name)
    }

    /// Object key of the compressed artifact.
    pub fn object_key(&self, extension: &str) -> String {
        format!("{}.{}", self.0, extension)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ArtifactRef {
    type Error = Error;

    fn try_from(name: String) -> Result<Self> {
        Self::new(name)
    }
}

impl From<ArtifactRef> for String {
    fn from(artifact: ArtifactRef) -> Self {
        artifact.0
    }
}

/// A file already received and written to local disk by the intake layer.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub path: PathBuf,
    pub name: ArtifactRef,
}

impl StagedFile {
    pub fn new(path: impl Into<PathBuf>, name: ArtifactRef) -> Self {
        Self {
            path: path.into(),
            name,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_key_from_digest_is_lower_hex() {
        let key = ContentKey::from_digest(&[0xAB, 0x01, 0xff]);
        assert_eq!(key.as_str(), "ab01ff");
    }

    #[test]
    fn test_content_key_parse() {
        let key: ContentKey = "5D41402ABC4B2A76B9719D911017C592".parse().unwrap();
        assert_eq!(key.as_str(), "5d41402abc4b2a76b9719d911017c592");

        assert!(ContentKey::parse("").is_err());
        assert!(ContentKey::parse("abc").is_err());
        assert!(ContentKey::parse("zz").is_err());
    }

    #[test]
    fn test_artifact_ref_rejects_path_components() {
        assert!(ArtifactRef::new("report.pdf").is_ok());
        assert!(ArtifactRef::new("").is_err());
        assert!(ArtifactRef::new("..").is_err());
        assert!(ArtifactRef::new("a/b").is_err());
        assert!(ArtifactRef::new("a\\b").is_err());
        assert!(ArtifactRef::new("a\"b").is_err());
    }

    #[test]
    fn test_with_suffix() {
        let name = ArtifactRef::new("report.pdf").unwrap();
        assert_eq!(name.with_suffix(1).as_str(), "report (1).pdf");
        assert_eq!(ArtifactRef::new("A").unwrap().with_suffix(2).as_str(), "A (2)");
        assert_eq!(ArtifactRef::new(".env").unwrap().with_suffix(1).as_str(), ".env (1)");
    }

    #[test]
    fn test_artifact_ref_from_upload_name() {
        let name = ArtifactRef::from_upload_name("../../etc/passwd").unwrap();
        assert_eq!(name.as_str(), "passwd");

        let name = ArtifactRef::from_upload_name("C:\\Users\\me\\notes?.txt").unwrap();
        assert_eq!(name.as_str(), "notes_.txt");

        assert!(ArtifactRef::from_upload_name("dir/").is_err());
    }

    #[test]
    fn test_object_key() {
        let name = ArtifactRef::new("A").unwrap();
        assert_eq!(name.object_key("bz2"), "A.bz2");
    }
}
