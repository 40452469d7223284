//! File upload extractor for multipart form data
//!
//! `FileUpload` pulls exactly one file part out of a `multipart/form-data`
//! request and hands it to the handler as an in-memory [`UploadedAsset`].
//! Non-file fields are ignored. The request-size ceiling comes from the
//! router's `DefaultBodyLimit`; exceeding it surfaces as `413`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use upload_store::extractors::FileUpload;
//! use upload_store::storage::AssetStore;
//! use upload_store::state::AppState;
//! use axum::{extract::State, response::IntoResponse};
//!
//! async fn upload_avatar(
//!     State(state): State<AppState>,
//!     FileUpload(asset): FileUpload,
//! ) -> Result<impl IntoResponse, String> {
//!     let stored = state.store().store(asset).await.map_err(|e| e.to_string())?;
//!     Ok(stored.stored_name)
//! }
//! ```

use crate::storage::UploadedAsset;
use axum::{
    extract::{
        multipart::{Field, MultipartError},
        FromRequest, Multipart, Request,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

/// Content type recorded when the client sends none
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Error types for file upload extraction
#[derive(Debug)]
pub enum FileUploadError {
    /// Missing file in the multipart request
    MissingFile,

    /// Multiple files found when expecting a single file
    MultipleFiles,

    /// Request body exceeded the configured limit
    PayloadTooLarge(String),

    /// Body is not valid multipart data or could not be read
    MultipartError(String),
}

impl fmt::Display for FileUploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFile => write!(f, "No file found in upload"),
            Self::MultipleFiles => write!(f, "Multiple files found, expected single file"),
            Self::PayloadTooLarge(msg) => write!(f, "Upload too large: {msg}"),
            Self::MultipartError(msg) => write!(f, "Multipart error: {msg}"),
        }
    }
}

impl std::error::Error for FileUploadError {}

impl From<MultipartError> for FileUploadError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(e.body_text())
        } else {
            Self::MultipartError(e.body_text())
        }
    }
}

impl IntoResponse for FileUploadError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MissingFile | Self::MultipleFiles | Self::MultipartError(_) => {
                StatusCode::BAD_REQUEST
            }
        };

        (status, self.to_string()).into_response()
    }
}

/// Extractor for a single file upload
///
/// # Examples
///
/// ```rust,no_run
/// use upload_store::extractors::FileUpload;
/// use axum::response::IntoResponse;
///
/// async fn handler(FileUpload(asset): FileUpload) -> impl IntoResponse {
///     format!("Received: {} ({} bytes)", asset.original_name, asset.size())
/// }
/// ```
#[derive(Debug)]
pub struct FileUpload(pub UploadedAsset);

impl<S> FromRequest<S> for FileUpload
where
    S: Send + Sync,
{
    type Rejection = FileUploadError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| FileUploadError::MultipartError(e.body_text()))?;

        let mut found: Option<UploadedAsset> = None;

        while let Some(field) = multipart.next_field().await? {
            // Skip non-file fields
            let Some(original_name) = field.file_name().map(ToString::to_string) else {
                continue;
            };

            if found.is_some() {
                return Err(FileUploadError::MultipleFiles);
            }

            found = Some(read_asset(field, original_name).await?);
        }

        found.map(Self).ok_or(FileUploadError::MissingFile)
    }
}

async fn read_asset(field: Field<'_>, original_name: String) -> Result<UploadedAsset, FileUploadError> {
    let content_type = field
        .content_type()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string();

    let data = field.bytes().await?;

    Ok(UploadedAsset {
        original_name,
        content_type,
        data,
    })
}
