//! Blob storage backends for Hoard.
//!
//! Every backend implements [`hoard_core::ports::BlobStore`]: the S3 backend
//! for deployments, the filesystem backend for local development and the
//! memory backend for tests and throwaway runs.

pub mod filesystem;
pub mod memory;
pub mod s3;

pub use filesystem::FilesystemBlobStore;
pub use memory::MemoryBlobStore;
pub use s3::{S3BlobStore, S3Config};
