//! File upload handler.

use axum::{
    Json,
    extract::{Multipart, State, multipart::Field},
    http::HeaderMap,
};
use hoard_cache::{TempArtifact, fingerprint_file};
use hoard_core::{ArtifactRef, StagedFile};
use hoard_trace::{UploadAttributes, upload_span};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{Instrument, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Multipart field carrying the file.
pub const FILE_FIELD: &str = "files";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub download_link: String,
}

/// Accept a file, resolve it against the cache and return a download link.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let request_id = headers
        .get(crate::middleware::REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let raw_name = field
            .file_name()
            .ok_or_else(|| ApiError::BadRequest("Upload is missing a file name".to_string()))?
            .to_string();
        let attrs = UploadAttributes::new()
            .request_id(request_id)
            .file(raw_name.as_str())
            .content_type(field.content_type().unwrap_or_default());

        return handle_file(&state, &raw_name, field)
            .instrument(upload_span(&attrs))
            .await
            .map(Json);
    }

    Err(ApiError::BadRequest(format!(
        "Missing multipart field '{FILE_FIELD}'"
    )))
}

async fn handle_file(
    state: &AppState,
    raw_name: &str,
    field: Field<'_>,
) -> Result<UploadResponse, ApiError> {
    let name = ArtifactRef::from_upload_name(raw_name)?;

    // one directory per request so equal names never collide
    let staging_dir = state.upload_dir.join(Uuid::new_v4().to_string());
    tokio::fs::create_dir_all(&staging_dir)
        .await
        .map_err(hoard_core::Error::from)?;
    let _staging = StagingDir(staging_dir.clone());

    let path = staging_dir.join(name.as_str());
    let _staged = TempArtifact::new(&path);
    write_field(field, &path).await?;

    let key = fingerprint_file(&path).await?;
    let resolution = state
        .coordinator
        .resolve_or_archive(&key, &StagedFile::new(&path, name))
        .await?;

    let object_key = state.coordinator.pipeline().object_key(&resolution.artifact);
    let download_link = state
        .blobs
        .signed_download_url(&object_key, state.link_ttl, Some(&object_key))
        .await?;

    info!(
        key = %key,
        artifact = %resolution.artifact,
        source = ?resolution.source,
        "Upload resolved"
    );
    Ok(UploadResponse { download_link })
}

async fn write_field(mut field: Field<'_>, path: &Path) -> Result<(), ApiError> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(hoard_core::Error::from)?;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        file.write_all(&chunk).await.map_err(hoard_core::Error::from)?;
    }
    file.flush().await.map_err(hoard_core::Error::from)?;
    Ok(())
}

/// Removes the per-request staging directory once it is empty.
struct StagingDir(PathBuf);

impl Drop for StagingDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir(&self.0);
    }
}
