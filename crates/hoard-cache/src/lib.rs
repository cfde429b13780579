//! Content-addressed dedup cache for Hoard.

pub mod archiver;
pub mod compression;
pub mod coordinator;
pub mod fast;
pub mod fingerprint;
pub mod metrics;
pub mod snapshot;
pub mod types;

pub use archiver::{ArchivePipeline, ArchivedArtifact, TempArtifact};
pub use compression::{CodecCompressor, ShellCompressor, decompress};
pub use coordinator::CacheCoordinator;
pub use fast::MemoryFastCache;
pub use fingerprint::{fingerprint_bytes, fingerprint_file, fingerprint_reader};
pub use metrics::CacheMetrics;
pub use snapshot::{CommitOutcome, DEFAULT_SNAPSHOT_KEY, SnapshotStore};
pub use types::{CacheStats, CompressionType, Resolution, ResolutionSource};
