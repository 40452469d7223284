//! Serving stored uploads with range requests and cache headers
//!
//! Stored names are immutable, so responses carry a long-lived
//! `Cache-Control`, an `ETag` derived from the stored name and size, and
//! honour `If-None-Match`, `Range` (single range only) and `If-Range`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use axum::{routing::get, Router};
//! use upload_store::middleware::serve_upload;
//! use upload_store::{config::UploadStoreConfig, state::AppState};
//!
//! # fn example() -> anyhow::Result<()> {
//! let state = AppState::new(UploadStoreConfig::default())?;
//! let app: Router = Router::new()
//!     .route("/uploads/{stored_name}", get(serve_upload))
//!     .with_state(state);
//! # Ok(())
//! # }
//! ```

use crate::error::AppError;
use crate::state::AppState;
use crate::storage::StoreError;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{
        header::{
            ACCEPT_RANGES, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG,
            IF_NONE_MATCH, IF_RANGE, LAST_MODIFIED, RANGE,
        },
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use std::fmt;
use std::time::SystemTime;
use tracing::debug;

/// Handler serving one stored asset
///
/// # Errors
///
/// Returns `FileServingError` for unknown or malformed stored names and for
/// invalid or unsatisfiable ranges.
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(stored_name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, FileServingError> {
    let store = state.store();
    let metadata = store.metadata(&stored_name).await?;
    let data = Bytes::from(store.retrieve(&stored_name).await?);

    let etag = format!(r#""{}-{}""#, stored_name, data.len());
    let content_type = mime_guess::from_path(&stored_name)
        .first_or_octet_stream()
        .to_string();

    let file = FileHeaders {
        etag,
        content_type,
        cache_control: format!(
            "public, max-age={}, immutable",
            state.config().storage.cache_max_age_secs
        ),
        last_modified: httpdate::fmt_http_date(metadata.modified.unwrap_or_else(SystemTime::now)),
    };

    if let Some(if_none_match) = headers.get(IF_NONE_MATCH) {
        if if_none_match.to_str().is_ok_and(|v| v == file.etag) {
            return Ok(not_modified(&file));
        }
    }

    if let Some(range_header) = headers.get(RANGE) {
        return serve_range_request(data, range_header, &file, &headers);
    }

    Ok(build_file_response(data, &file, None))
}

/// Headers shared by full and partial responses
struct FileHeaders {
    etag: String,
    content_type: String,
    cache_control: String,
    last_modified: String,
}

fn serve_range_request(
    data: Bytes,
    range_header: &HeaderValue,
    file: &FileHeaders,
    headers: &HeaderMap,
) -> Result<Response, FileServingError> {
    // A stale validator means the client gets the whole asset
    if let Some(if_range) = headers.get(IF_RANGE) {
        if if_range.to_str().map_or(true, |v| v != file.etag) {
            return Ok(build_file_response(data, file, None));
        }
    }

    let range = range_header
        .to_str()
        .map_err(|_| FileServingError::InvalidRange)?;
    let Some((start, end)) = parse_range(range, data.len())? else {
        debug!(range, "ignoring unsupported range");
        return Ok(build_file_response(data, file, None));
    };

    debug!(start, end, size = data.len(), "serving partial content");

    let content_range = format!("bytes {start}-{end}/{}", data.len());
    Ok(build_file_response(
        data.slice(start..=end),
        file,
        Some(&content_range),
    ))
}

/// Parses a single `bytes=` range against a body of `size` bytes
///
/// Returns inclusive `(start, end)` offsets, with `end` clamped to the last byte.
/// Other units and multi-range sets yield `None` and are answered with the
/// whole asset.
fn parse_range(range: &str, size: usize) -> Result<Option<(usize, usize)>, FileServingError> {
    let (unit, set) = range
        .split_once('=')
        .ok_or(FileServingError::InvalidRange)?;
    if !unit.trim().eq_ignore_ascii_case("bytes") || set.contains(',') {
        return Ok(None);
    }
    let (start_str, end_str) = set.split_once('-').ok_or(FileServingError::InvalidRange)?;

    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .map_err(|_| FileServingError::InvalidRange)
    };

    if size == 0 {
        return Err(FileServingError::RangeNotSatisfiable(size));
    }
    let last = size - 1;

    let (start, end) = if start_str.trim().is_empty() {
        // Suffix range: -500 means the last 500 bytes
        (size.saturating_sub(parse(end_str)?), last)
    } else if end_str.trim().is_empty() {
        (parse(start_str)?, last)
    } else {
        (parse(start_str)?, parse(end_str)?.min(last))
    };

    if start > end || start >= size {
        return Err(FileServingError::RangeNotSatisfiable(size));
    }

    Ok(Some((start, end)))
}

fn not_modified(file: &FileHeaders) -> Response {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(ETAG, &file.etag)
        .header(CACHE_CONTROL, &file.cache_control)
        .header(LAST_MODIFIED, &file.last_modified)
        .body(Body::empty())
        .unwrap_or_else(|_| StatusCode::NOT_MODIFIED.into_response())
}

fn build_file_response(data: Bytes, file: &FileHeaders, content_range: Option<&str>) -> Response {
    let status = if content_range.is_some() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let mut response = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, &file.content_type)
        .header(CONTENT_LENGTH, data.len())
        .header(ETAG, &file.etag)
        .header(ACCEPT_RANGES, "bytes")
        .header(CACHE_CONTROL, &file.cache_control)
        .header(LAST_MODIFIED, &file.last_modified);

    if let Some(content_range) = content_range {
        response = response.header(CONTENT_RANGE, content_range);
    }

    response
        .body(Body::from(data))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

/// Error types for file serving
#[derive(Debug)]
pub enum FileServingError {
    /// Upload store error
    Store(StoreError),
    /// Malformed `Range` header
    InvalidRange,
    /// Range outside the asset (carries the asset size)
    RangeNotSatisfiable(usize),
}

impl From<StoreError> for FileServingError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl fmt::Display for FileServingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "{e}"),
            Self::InvalidRange => write!(f, "Invalid range request"),
            Self::RangeNotSatisfiable(size) => {
                write!(f, "Range not satisfiable (file size: {size})")
            }
        }
    }
}

impl std::error::Error for FileServingError {}

impl IntoResponse for FileServingError {
    fn into_response(self) -> Response {
        match self {
            Self::Store(e) => AppError::from(e).into_response(),
            Self::InvalidRange => (StatusCode::BAD_REQUEST, self.to_string()).into_response(),
            Self::RangeNotSatisfiable(size) => Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(CONTENT_RANGE, format!("bytes */{size}"))
                .body(Body::from(self.to_string()))
                .unwrap_or_else(|_| Response::new(Body::empty())),
        }
    }
}
