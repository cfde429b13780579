//! Span creation for cache operations.

use tracing::{Level, Span, span};

/// Upload span attributes.
#[derive(Debug, Default)]
pub struct UploadAttributes {
    pub request_id: Option<String>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl UploadAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn file(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Create a span for an HTTP upload.
pub fn upload_span(attrs: &UploadAttributes) -> Span {
    span!(
        Level::INFO,
        "upload.handle",
        http.request_id = attrs.request_id.as_deref().unwrap_or(""),
        upload.file_name = attrs.file_name.as_deref().unwrap_or(""),
        upload.content_type = attrs.content_type.as_deref().unwrap_or(""),
    )
}

/// Create a span for a lookup-or-archive call.
pub fn resolve_span(key: &str) -> Span {
    span!(Level::INFO, "cache.resolve", cache.key = key)
}

/// Create a span for the compress-and-upload pipeline.
pub fn archive_span(artifact: &str, object_key: &str) -> Span {
    span!(
        Level::INFO,
        "cache.archive",
        cache.artifact = artifact,
        storage.object_key = object_key,
    )
}

pub fn reconcile_span() -> Span {
    span!(Level::DEBUG, "cache.reconcile")
}
