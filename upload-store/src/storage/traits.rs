//! Upload store trait definition

use super::types::{AssetMetadata, StoreResult, StoredAsset, UploadedAsset};
use async_trait::async_trait;

/// Abstraction over places uploaded assets are persisted
///
/// Handlers depend on this trait rather than on a concrete backend so the
/// storage location can be swapped or mocked in tests.
///
/// Implementations must:
/// - Generate a stored name that is unique within the storage namespace
/// - Never use the client-supplied name as a path without sanitizing it
/// - Never return a stored name for a write that did not complete
///
/// Assets are write-once. There is no delete operation.
///
/// # Examples
///
/// ```rust,no_run
/// use upload_store::storage::{AssetStore, LocalAssetStore, UploadedAsset};
///
/// # async fn example() -> anyhow::Result<()> {
/// let store = LocalAssetStore::new("./public")?;
///
/// let asset = UploadedAsset::new("avatar.png", "image/png", vec![/* ... */]);
/// let stored = store.store(asset).await?;
///
/// // Persist `stored.stored_name`, then later:
/// let data = store.retrieve(&stored.stored_name).await?;
/// let url = store.url(&stored.stored_name).await?;
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Persists an uploaded asset and returns its stored name and metadata
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The client name sanitizes to nothing (`StoreError::InvalidInput`)
    /// - The destination cannot be written (`StoreError::Write`)
    async fn store(&self, asset: UploadedAsset) -> StoreResult<StoredAsset>;

    /// Reads the bytes of a stored asset
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The stored name is malformed (`StoreError::InvalidPath`)
    /// - The asset doesn't exist (`StoreError::NotFound`)
    /// - File I/O fails
    async fn retrieve(&self, stored_name: &str) -> StoreResult<Vec<u8>>;

    /// Checks whether a stored asset exists
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidPath` for malformed stored names.
    async fn exists(&self, stored_name: &str) -> StoreResult<bool>;

    /// Reads filesystem metadata of a stored asset without loading its bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the name is malformed or the asset doesn't exist.
    async fn metadata(&self, stored_name: &str) -> StoreResult<AssetMetadata>;

    /// Returns the public URL path an asset is served from
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidPath` for malformed stored names.
    async fn url(&self, stored_name: &str) -> StoreResult<String>;
}
