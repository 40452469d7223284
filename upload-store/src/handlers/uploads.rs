//! Upload handler
//!
//! Accepts a single multipart file, persists it through the configured
//! [`AssetStore`](crate::storage::AssetStore) and answers with the stored
//! name the caller should keep.

use axum::{
    extract::State,
    http::{header::LOCATION, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::FileUpload;
use crate::state::AppState;

/// Response for a successful upload
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Identifier to persist and later resolve the asset with
    pub stored_name: String,
    /// Name the client supplied
    pub original_name: String,
    /// Size in bytes
    pub size: u64,
    /// Public URL path the asset is served from
    pub url: String,
}

/// Store an uploaded file
///
/// # Errors
///
/// - `400` if the file name is unusable
/// - `413` if the file exceeds `storage.max_upload_bytes`
/// - `500` if the uploads directory cannot be written
///
/// # Example
///
/// ```bash
/// curl -F file=@photo.png http://localhost:3000/uploads
/// ```
///
/// Response (`201 Created`, `Location: /uploads/1700000000000-photo.png`):
/// ```json
/// {
///   "stored_name": "1700000000000-photo.png",
///   "original_name": "photo.png",
///   "size": 48213,
///   "url": "/uploads/1700000000000-photo.png"
/// }
/// ```
pub async fn upload(
    State(state): State<AppState>,
    FileUpload(asset): FileUpload,
) -> Result<impl IntoResponse, AppError> {
    asset.validate_size(state.config().storage.max_upload_bytes)?;

    let store = state.store();
    let stored = store.store(asset).await?;
    let url = store.url(&stored.stored_name).await?;

    let response = UploadResponse {
        stored_name: stored.stored_name,
        original_name: stored.original_name,
        size: stored.size,
        url: url.clone(),
    };

    Ok((StatusCode::CREATED, [(LOCATION, url)], Json(response)))
}
