//! Hoard Core
//!
//! Core domain types, traits, and error handling for Hoard.
//! This crate has minimal dependencies and defines the shared vocabulary
//! used by the cache core, the storage adapters and the HTTP surface.

pub mod cache;
pub mod content;
pub mod error;
pub mod ports;

pub use cache::CacheSnapshot;
pub use content::{ArtifactRef, ContentKey, StagedFile};
pub use error::{Error, Result};
