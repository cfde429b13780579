//! Error types for Hoard.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Content errors
    #[error("Invalid content key: {0}")]
    InvalidContentKey(String),

    #[error("Invalid artifact name: {0}")]
    InvalidArtifactName(String),

    // Pipeline errors
    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Artifact upload failed: {0}")]
    UploadFailed(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Conditional write rejected for {key}: {reason}")]
    Conflict { key: String, reason: String },

    // Infrastructure errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error aborted the compress-then-upload sequence.
    pub fn is_pipeline_failure(&self) -> bool {
        matches!(self, Error::CompressionFailed(_) | Error::UploadFailed(_))
    }

    /// Whether the error was caused by caller-supplied input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidContentKey(_) | Error::InvalidArtifactName(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
