//! API route definitions.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{cache, health, upload};
use crate::middleware::{cors_layer, request_id};
use crate::state::AppState;

/// Router options that are not part of the shared state.
#[derive(Debug, Clone, Default)]
pub struct RouterOptions<'a> {
    /// Served as the fallback for unmatched paths.
    pub static_dir: Option<&'a Path>,
    /// Request body cap; the axum default applies when unset.
    pub max_upload_bytes: Option<usize>,
}

/// Create the main API router.
pub fn create_router(state: Arc<AppState>, options: RouterOptions<'_>) -> Router {
    let mut router = Router::new()
        .nest("/api/v1", api_routes())
        .route("/upload", post(upload::upload))
        .route("/health", get(health::health))
        .route("/ready", get(health::ready));

    if let Some(dir) = options.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }
    if let Some(limit) = options.max_upload_bytes {
        router = router.layer(DefaultBodyLimit::max(limit));
    }

    router
        .layer(axum::middleware::from_fn(request_id))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/cache", cache_routes())
}

fn cache_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(cache::stats))
        .route("/reconcile", post(cache::reconcile))
        .route("/flush", post(cache::flush))
}
