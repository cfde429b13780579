//! Service configuration.

use anyhow::{Context, Result};
use hoard_cache::{DEFAULT_SNAPSHOT_KEY, ShellCompressor};
use hoard_storage::S3Config;
use hoard_trace::TracingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration, read from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HoardConfig {
    /// Socket address the HTTP server binds.
    pub listen: String,
    /// Where uploads are staged before fingerprinting.
    pub upload_dir: PathBuf,
    /// Static assets served for unmatched paths.
    pub static_dir: Option<PathBuf>,
    pub link_ttl_secs: u64,
    pub max_upload_bytes: usize,
    /// Object key of the durable snapshot document.
    pub snapshot_key: String,
    /// Rebuild the fast cache from the snapshot at startup.
    pub warm_on_start: bool,
    pub max_commit_attempts: u32,
    /// Delete the staged original once it has been archived.
    pub remove_source: bool,
    pub storage: StorageConfig,
    pub compression: CompressionConfig,
    pub tracing: TracingConfig,
}

impl Default for HoardConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            static_dir: None,
            link_ttl_secs: 3600,
            max_upload_bytes: 512 * 1024 * 1024,
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
            warm_on_start: false,
            max_commit_attempts: 5,
            remove_source: false,
            storage: StorageConfig::default(),
            compression: CompressionConfig::default(),
            tracing: TracingConfig::default(),
        }
    }
}

/// Blob storage backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfig {
    S3(S3Config),
    Filesystem { root: PathBuf },
    Memory,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Filesystem {
            root: PathBuf::from("hoard-data"),
        }
    }
}

/// Compressor used by the archive pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompressionConfig {
    Shell(ShellCompressor),
    Zstd,
    Gzip,
    Lz4,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self::Shell(ShellCompressor::bzip2())
    }
}

impl HoardConfig {
    /// Load configuration from `path`, or from the user config directory.
    ///
    /// An explicit path must exist; the default location falls back to
    /// built-in defaults when absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Get the default configuration file path.
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "hoard", "hoard")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Copy suitable for display, with secrets masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if let StorageConfig::S3(s3) = &mut config.storage {
            if s3.secret_access_key.is_some() {
                s3.secret_access_key = Some("***".to_string());
            }
            if s3.session_token.is_some() {
                s3.session_token = Some("***".to_string());
            }
        }
        config
    }
}
