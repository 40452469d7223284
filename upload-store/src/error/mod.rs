//! Error types and HTTP error mapping

use crate::storage::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Handler-level error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Upload store error
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    /// HTTP status this error maps to
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::InvalidInput(_) | StoreError::InvalidPath(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Store(StoreError::Write { .. } | StoreError::Io(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side failures are logged in full but not echoed to clients
        let message = if status.is_server_error() {
            error!(error = %self, "upload request failed");
            "Failed to store upload".to_string()
        } else {
            self.to_string()
        };

        (status, message).into_response()
    }
}
