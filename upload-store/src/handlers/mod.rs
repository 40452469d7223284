//! HTTP handlers and router assembly

pub mod uploads;

use crate::middleware::serve_upload;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Room left in the request body limit for multipart framing
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Build the upload router
///
/// - `POST <url_prefix>` stores a single multipart file
/// - `GET <url_prefix>/{stored_name}` serves a stored asset
///
/// # Example
///
/// ```rust,no_run
/// use upload_store::{config::UploadStoreConfig, handlers, state::AppState};
///
/// # async fn example() -> anyhow::Result<()> {
/// let state = AppState::new(UploadStoreConfig::default())?;
/// let app = handlers::router(state);
///
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn router(state: AppState) -> Router {
    let storage = &state.config().storage;
    let prefix = storage.normalized_url_prefix();
    let body_limit = usize::try_from(storage.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES))
        .unwrap_or(usize::MAX);

    Router::new()
        .route(&prefix, post(uploads::upload))
        .route(&format!("{prefix}/{{stored_name}}"), get(serve_upload))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
