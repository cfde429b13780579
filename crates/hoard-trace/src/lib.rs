//! Logging and OpenTelemetry integration for Hoard.
//!
//! Installs the `tracing` subscriber (env filter, fmt output, optional OTLP
//! export) and provides span constructors for cache operations.

pub mod spans;
pub mod tracer;

pub use spans::{UploadAttributes, archive_span, reconcile_span, resolve_span, upload_span};
pub use tracer::{
    LogFormat, OtlpConfig, Protocol, TracerError, TracingConfig, init_tracer, shutdown_tracer,
};
