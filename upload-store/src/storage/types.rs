//! Core types for the upload store

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

/// Errors that can occur while storing or looking up uploaded assets
#[derive(Debug, Error)]
pub enum StoreError {
    /// The destination could not be written (missing directory, permission
    /// denied, disk full, ...)
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// Path the store attempted to write
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// The uploaded payload or its name cannot be used
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Stored name does not refer to an asset
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Stored name is not a single safe path component
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Payload exceeds the configured upload limit
    #[error("Upload size {actual} exceeds limit of {limit} bytes")]
    TooLarge {
        /// Actual payload size
        actual: u64,
        /// Maximum allowed size
        limit: u64,
    },

    /// I/O error while reading an existing asset
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for upload store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// An uploaded payload that has not been stored yet
///
/// The payload is fully materialized in memory. `original_name` comes straight
/// from the client and is never used as a path without sanitization.
///
/// # Examples
///
/// ```rust
/// use upload_store::storage::UploadedAsset;
///
/// let asset = UploadedAsset::new("photo.png", "image/png", b"\x89PNG".to_vec());
/// assert_eq!(asset.size(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    /// Client-supplied file name, untrusted
    pub original_name: String,

    /// MIME content type reported by the client
    pub content_type: String,

    /// Payload bytes
    pub data: Bytes,
}

impl UploadedAsset {
    /// Creates a new uploaded asset
    #[must_use]
    pub fn new(
        original_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Returns the payload size in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Validates the payload size against a maximum limit
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TooLarge` if the payload is larger than `max_bytes`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use upload_store::storage::UploadedAsset;
    ///
    /// let asset = UploadedAsset::new("a.txt", "text/plain", b"abc".to_vec());
    /// assert!(asset.validate_size(10).is_ok());
    /// assert!(asset.validate_size(2).is_err());
    /// ```
    pub fn validate_size(&self, max_bytes: u64) -> StoreResult<()> {
        let size = self.size();
        if size > max_bytes {
            return Err(StoreError::TooLarge {
                actual: size,
                limit: max_bytes,
            });
        }
        Ok(())
    }
}

/// An asset that has been written to the store
///
/// `stored_name` is the identifier callers persist (for example in a database
/// row) and later append to the public uploads path to serve the content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredAsset {
    /// Generated name, unique within the storage root
    pub stored_name: String,

    /// Name the client supplied
    pub original_name: String,

    /// MIME content type reported by the client
    pub content_type: String,

    /// Payload size in bytes
    pub size: u64,

    /// Filesystem location of the stored bytes
    pub storage_path: PathBuf,
}

impl fmt::Display for StoredAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StoredAsset(stored_name={}, original_name={}, size={})",
            self.stored_name, self.original_name, self.size
        )
    }
}

/// Filesystem facts about a stored asset, read without loading its content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMetadata {
    /// Stored name of the asset
    pub stored_name: String,

    /// Size in bytes
    pub size: u64,

    /// Last modification time reported by the filesystem
    pub modified: Option<SystemTime>,

    /// Upload time decoded from the stored name's timestamp prefix
    pub uploaded_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uploaded_asset_size() {
        let asset = UploadedAsset::new("test.txt", "text/plain", vec![1, 2, 3, 4, 5]);
        assert_eq!(asset.size(), 5);
    }

    #[test]
    fn test_validate_size() {
        let asset = UploadedAsset::new("test.txt", "text/plain", vec![1, 2, 3, 4, 5]);
        assert!(asset.validate_size(5).is_ok());
        assert!(matches!(
            asset.validate_size(3).unwrap_err(),
            StoreError::TooLarge { actual: 5, limit: 3 }
        ));
    }

    #[test]
    fn test_write_error_mentions_path() {
        let err = StoreError::write(
            Path::new("/srv/public/uploads/1-a.txt"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(err.to_string().contains("/srv/public/uploads/1-a.txt"));
    }

    #[test]
    fn test_stored_asset_display() {
        let stored = StoredAsset {
            stored_name: "1700000000000-a.txt".to_string(),
            original_name: "a.txt".to_string(),
            content_type: "text/plain".to_string(),
            size: 5,
            storage_path: PathBuf::from("/tmp/public/uploads/1700000000000-a.txt"),
        };
        let display = stored.to_string();
        assert!(display.contains("1700000000000-a.txt"));
        assert!(display.contains("size=5"));
    }
}
