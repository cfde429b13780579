//! Cache administration handlers.

use axum::{Json, extract::State};
use hoard_cache::CacheStats;
use serde::Serialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    /// `false` when no snapshot exists yet.
    pub snapshot_found: bool,
    pub entries: usize,
}

#[derive(Debug, Serialize)]
pub struct FlushResponse {
    pub flushed: bool,
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<CacheStats> {
    Json(state.coordinator.stats())
}

pub async fn reconcile(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReconcileResponse>, ApiError> {
    let loaded = state.coordinator.reconcile().await?;
    Ok(Json(ReconcileResponse {
        snapshot_found: loaded.is_some(),
        entries: loaded.unwrap_or(0),
    }))
}

pub async fn flush(State(state): State<Arc<AppState>>) -> Json<FlushResponse> {
    state.coordinator.flush();
    Json(FlushResponse { flushed: true })
}
