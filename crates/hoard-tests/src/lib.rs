//! Integration test infrastructure for Hoard.
//!
//! Runs the cache against a real S3 implementation (MinIO) started with
//! testcontainers.
//!
//! # Usage
//!
//! ```ignore
//! use hoard_tests::TestContext;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let ctx = TestContext::new().await.unwrap();
//!     // Use ctx.blobs, ctx.coordinator(), etc.
//! }
//! ```

pub mod containers;
pub mod context;
pub mod helpers;

pub use context::TestContext;
pub use helpers::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,hoard_cache=debug,hoard_storage=debug")),
        )
        .with_test_writer()
        .try_init();
}
