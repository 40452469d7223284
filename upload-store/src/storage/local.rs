//! Local filesystem upload store

use super::naming::{self, Clock, SystemClock};
use super::traits::AssetStore;
use super::types::{AssetMetadata, StoreError, StoreResult, StoredAsset, UploadedAsset};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Directory under the public root that holds uploaded assets
pub const UPLOADS_DIR: &str = "uploads";

/// Default URL path stored assets are served from
pub const DEFAULT_URL_PREFIX: &str = "/uploads";

/// How many stored names are tried for one upload before giving up
pub(crate) const MAX_CREATE_ATTEMPTS: u32 = 16;

/// Upload store writing into `<public_root>/uploads`
///
/// Every asset becomes exactly one flat file named `<millis>-<name>`, so the
/// uploads directory can be handed to any static file server as is.
///
/// # Directory Structure
///
/// ```text
/// ./public/
/// └── uploads/
///     ├── 1700000000000-a.txt
///     ├── 1700000000000-1-a.txt
///     └── 1700000004211-photo.png
/// ```
///
/// The uploads directory must already exist. A missing or unwritable
/// directory surfaces as `StoreError::Write` from [`AssetStore::store`].
///
/// # Examples
///
/// ```rust,no_run
/// use upload_store::storage::{AssetStore, LocalAssetStore, UploadedAsset};
///
/// # async fn example() -> anyhow::Result<()> {
/// let store = LocalAssetStore::new("./public")?;
///
/// let asset = UploadedAsset::new("photo.jpg", "image/jpeg", vec![/* ... */]);
/// let stored = store.store(asset).await?;
///
/// // Stored at ./public/uploads/1700000000000-photo.jpg
/// println!("Stored at: {}", stored.storage_path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    uploads_dir: PathBuf,
    url_prefix: String,
    clock: Arc<dyn Clock>,
}

impl LocalAssetStore {
    /// Creates a store rooted at `public_root`
    ///
    /// The uploads directory is not created here.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidPath` if `public_root` or its uploads
    /// directory exists but is not a directory.
    pub fn new(public_root: impl Into<PathBuf>) -> StoreResult<Self> {
        let public_root = public_root.into();

        // Synchronous checks are fine at construction time
        if public_root.exists() && !public_root.is_dir() {
            return Err(StoreError::InvalidPath(format!(
                "{} is not a directory",
                public_root.display()
            )));
        }

        let uploads_dir = public_root.join(UPLOADS_DIR);
        if uploads_dir.exists() && !uploads_dir.is_dir() {
            return Err(StoreError::InvalidPath(format!(
                "{} is not a directory",
                uploads_dir.display()
            )));
        }

        Ok(Self {
            uploads_dir,
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
            clock: Arc::new(SystemClock),
        })
    }

    /// Sets the URL path returned by [`AssetStore::url`]
    #[must_use]
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    /// Replaces the clock used for the timestamp prefix
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn asset_path(&self, stored_name: &str) -> StoreResult<PathBuf> {
        naming::validate_stored_name(stored_name)?;
        Ok(self.uploads_dir.join(stored_name))
    }

    /// Opens a fresh file for `sanitized`, never reusing an existing name
    async fn create_exclusive(&self, sanitized: &str) -> StoreResult<(String, PathBuf, fs::File)> {
        let millis = self.clock.now_millis();

        for attempt in 0..MAX_CREATE_ATTEMPTS {
            let stored_name = naming::stored_name(millis, attempt, sanitized);
            let path = self.uploads_dir.join(&stored_name);

            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => return Ok((stored_name, path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    warn!(stored_name = %stored_name, attempt, "stored name already taken, retrying");
                }
                Err(e) => return Err(StoreError::write(&path, e)),
            }
        }

        Err(StoreError::write(
            &self.uploads_dir,
            std::io::Error::new(
                ErrorKind::AlreadyExists,
                format!("no free stored name for {sanitized} at {millis}"),
            ),
        ))
    }
}

/// Writes `data` to the freshly created file at `path`
///
/// On failure the file is removed so a name is never handed out for a
/// partial asset.
async fn write_or_discard<W>(mut writer: W, path: &Path, data: &[u8]) -> StoreResult<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(data).await?;
        writer.flush().await
    }
    .await;
    drop(writer);

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(path).await {
            warn!(path = %path.display(), error = %cleanup, "failed to remove partial upload");
        }
        return Err(StoreError::write(path, e));
    }

    Ok(())
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn store(&self, asset: UploadedAsset) -> StoreResult<StoredAsset> {
        let sanitized = naming::sanitize_filename(&asset.original_name)?;
        let (stored_name, path, file) = self.create_exclusive(&sanitized).await?;

        write_or_discard(file, &path, &asset.data).await?;

        info!(
            stored_name = %stored_name,
            original_name = %asset.original_name,
            size = asset.size(),
            "stored upload"
        );

        Ok(StoredAsset {
            stored_name,
            original_name: asset.original_name,
            content_type: asset.content_type,
            size: asset.data.len() as u64,
            storage_path: path,
        })
    }

    async fn retrieve(&self, stored_name: &str) -> StoreResult<Vec<u8>> {
        let path = self.asset_path(stored_name)?;

        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(stored_name, "asset not found");
                Err(StoreError::NotFound(stored_name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, stored_name: &str) -> StoreResult<bool> {
        let path = self.asset_path(stored_name)?;

        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn metadata(&self, stored_name: &str) -> StoreResult<AssetMetadata> {
        let path = self.asset_path(stored_name)?;

        let meta = match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(StoreError::NotFound(stored_name.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(stored_name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(AssetMetadata {
            stored_name: stored_name.to_string(),
            size: meta.len(),
            modified: meta.modified().ok(),
            uploaded_at: naming::uploaded_at(stored_name),
        })
    }

    async fn url(&self, stored_name: &str) -> StoreResult<String> {
        naming::validate_stored_name(stored_name)?;
        Ok(format!("{}/{stored_name}", self.url_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FixedClock;
    use tempfile::TempDir;

    const MILLIS: i64 = 1_700_000_000_000;

    fn create_test_store() -> (LocalAssetStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join(UPLOADS_DIR)).unwrap();
        let store = LocalAssetStore::new(temp_dir.path()).unwrap();
        (store, temp_dir)
    }

    fn fixed(store: LocalAssetStore) -> LocalAssetStore {
        store.with_clock(Arc::new(FixedClock(MILLIS)))
    }

    #[tokio::test]
    async fn test_store_at_fixed_millisecond() {
        let (store, temp) = create_test_store();
        let store = fixed(store);

        let stored = store
            .store(UploadedAsset::new("a.txt", "text/plain", b"hello".to_vec()))
            .await
            .unwrap();

        assert_eq!(stored.stored_name, "1700000000000-a.txt");
        assert_eq!(stored.size, 5);

        let on_disk = std::fs::read(temp.path().join("uploads/1700000000000-a.txt")).unwrap();
        assert_eq!(on_disk, b"hello");
    }

    #[tokio::test]
    async fn test_store_and_retrieve_exact_bytes() {
        let (store, _temp) = create_test_store();

        let payload: Vec<u8> = (0_u8..=255).cycle().take(4096).collect();
        let stored = store
            .store(UploadedAsset::new("photo.png", "image/png", payload.clone()))
            .await
            .unwrap();

        let (prefix, suffix) = stored.stored_name.split_once('-').unwrap();
        assert!(prefix.parse::<i64>().is_ok());
        assert_eq!(suffix, "photo.png");

        assert_eq!(store.retrieve(&stored.stored_name).await.unwrap(), payload);
        assert_eq!(std::fs::read(&stored.storage_path).unwrap(), payload);
    }

    #[tokio::test]
    async fn test_identical_input_gets_distinct_names() {
        let (store, _temp) = create_test_store();
        let store = fixed(store);

        let first = store
            .store(UploadedAsset::new("a.txt", "text/plain", b"one".to_vec()))
            .await
            .unwrap();
        let second = store
            .store(UploadedAsset::new("a.txt", "text/plain", b"two".to_vec()))
            .await
            .unwrap();

        assert_eq!(first.stored_name, "1700000000000-a.txt");
        assert_eq!(second.stored_name, "1700000000000-1-a.txt");
        assert_eq!(store.retrieve(&first.stored_name).await.unwrap(), b"one");
        assert_eq!(store.retrieve(&second.stored_name).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_concurrent_stores_never_overwrite() {
        let (store, _temp) = create_test_store();
        let store = Arc::new(fixed(store));

        let handles: Vec<_> = (0..8_u8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let stored = store
                        .store(UploadedAsset::new("same.bin", "application/octet-stream", vec![i; 32]))
                        .await
                        .unwrap();
                    (i, stored.stored_name)
                })
            })
            .collect();

        let mut names = std::collections::HashSet::new();
        for handle in handles {
            let (i, name) = handle.await.unwrap();
            assert_eq!(store.retrieve(&name).await.unwrap(), vec![i; 32]);
            assert!(names.insert(name));
        }
        assert_eq!(names.len(), 8);
    }

    #[tokio::test]
    async fn test_name_exhaustion_is_write_error() {
        let (store, _temp) = create_test_store();
        let store = fixed(store);

        for _ in 0..MAX_CREATE_ATTEMPTS {
            store
                .store(UploadedAsset::new("a.txt", "text/plain", b"x".to_vec()))
                .await
                .unwrap();
        }

        let result = store
            .store(UploadedAsset::new("a.txt", "text/plain", b"x".to_vec()))
            .await;
        assert!(matches!(result.unwrap_err(), StoreError::Write { .. }));
    }

    #[tokio::test]
    async fn test_traversal_name_stays_inside_uploads() {
        let (store, temp) = create_test_store();
        let store = fixed(store);

        let stored = store
            .store(UploadedAsset::new("../../etc/passwd", "text/plain", b"root".to_vec()))
            .await
            .unwrap();

        assert_eq!(stored.stored_name, "1700000000000-passwd");
        assert_eq!(stored.storage_path.parent().unwrap(), temp.path().join(UPLOADS_DIR));
        assert!(!temp.path().join("etc").exists());

        let entries: Vec<_> = std::fs::read_dir(temp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "only the uploads directory should exist");
    }

    #[tokio::test]
    async fn test_unusable_name_is_invalid_input() {
        let (store, temp) = create_test_store();

        let result = store
            .store(UploadedAsset::new("../..", "text/plain", b"x".to_vec()))
            .await;
        assert!(matches!(result.unwrap_err(), StoreError::InvalidInput(_)));

        let count = std::fs::read_dir(temp.path().join(UPLOADS_DIR)).unwrap().count();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_missing_uploads_directory_is_write_error() {
        let temp = TempDir::new().unwrap();
        let store = LocalAssetStore::new(temp.path()).unwrap();

        let result = store
            .store(UploadedAsset::new("a.txt", "text/plain", b"hello".to_vec()))
            .await;

        assert!(matches!(result.unwrap_err(), StoreError::Write { .. }));
        assert!(!temp.path().join(UPLOADS_DIR).exists());
    }

    #[tokio::test]
    async fn test_failed_write_removes_partial_file() {
        let (store, temp) = create_test_store();
        let path = store.uploads_dir.join("1700000000000-a.txt");
        std::fs::write(&path, b"hel").unwrap();

        // Writes into a duplex stream fail once its reader is gone
        let (writer, reader) = tokio::io::duplex(8);
        drop(reader);

        let result = write_or_discard(writer, &path, b"hello world").await;

        assert!(matches!(result.unwrap_err(), StoreError::Write { .. }));
        let remaining = std::fs::read_dir(temp.path().join(UPLOADS_DIR)).unwrap().count();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_successful_write_keeps_file() {
        let (store, _temp) = create_test_store();
        let path = store.uploads_dir.join("1700000000000-a.txt");
        let file = fs::File::create(&path).await.unwrap();

        write_or_discard(file, &path, b"hello").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_empty_payload_is_stored() {
        let (store, _temp) = create_test_store();

        let stored = store
            .store(UploadedAsset::new("empty.txt", "text/plain", Vec::new()))
            .await
            .unwrap();

        assert_eq!(stored.size, 0);
        assert!(store.retrieve(&stored.stored_name).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_nonexistent() {
        let (store, _temp) = create_test_store();

        let result = store.retrieve("1700000000000-missing.txt").await;
        assert!(matches!(result.unwrap_err(), StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_lookups_reject_traversal() {
        let (store, _temp) = create_test_store();

        assert!(matches!(
            store.retrieve("../secret").await.unwrap_err(),
            StoreError::InvalidPath(_)
        ));
        assert!(matches!(
            store.exists("..").await.unwrap_err(),
            StoreError::InvalidPath(_)
        ));
        assert!(matches!(
            store.metadata("a/b").await.unwrap_err(),
            StoreError::InvalidPath(_)
        ));
        assert!(matches!(
            store.url(".env").await.unwrap_err(),
            StoreError::InvalidPath(_)
        ));
    }

    #[tokio::test]
    async fn test_exists() {
        let (store, _temp) = create_test_store();

        assert!(!store.exists("1-nothing.txt").await.unwrap());

        let stored = store
            .store(UploadedAsset::new("test.txt", "text/plain", b"Test".to_vec()))
            .await
            .unwrap();
        assert!(store.exists(&stored.stored_name).await.unwrap());
    }

    #[tokio::test]
    async fn test_directory_is_neither_existing_nor_readable_asset() {
        let (store, temp) = create_test_store();
        std::fs::create_dir(temp.path().join(UPLOADS_DIR).join("1-dir")).unwrap();

        assert!(!store.exists("1-dir").await.unwrap());
        assert!(matches!(
            store.metadata("1-dir").await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_metadata() {
        let (store, _temp) = create_test_store();
        let store = fixed(store);

        let stored = store
            .store(UploadedAsset::new("doc.pdf", "application/pdf", b"fake pdf".to_vec()))
            .await
            .unwrap();

        let meta = store.metadata(&stored.stored_name).await.unwrap();
        assert_eq!(meta.stored_name, stored.stored_name);
        assert_eq!(meta.size, 8);
        assert!(meta.modified.is_some());
        assert_eq!(meta.uploaded_at.unwrap().timestamp_millis(), MILLIS);

        assert!(matches!(
            store.metadata("1-missing.pdf").await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_url_generation() {
        let (store, _temp) = create_test_store();
        assert_eq!(
            store.url("1700000000000-a.txt").await.unwrap(),
            "/uploads/1700000000000-a.txt"
        );

        let store = store.with_url_prefix("/static/files/");
        assert_eq!(
            store.url("1700000000000-a.txt").await.unwrap(),
            "/static/files/1700000000000-a.txt"
        );
    }

    #[test]
    fn test_invalid_public_root() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("not-a-directory");
        std::fs::write(&file_path, b"test").unwrap();

        let result = LocalAssetStore::new(file_path);
        assert!(matches!(result.unwrap_err(), StoreError::InvalidPath(_)));
    }

    #[test]
    fn test_uploads_path_is_a_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(UPLOADS_DIR), b"test").unwrap();

        let result = LocalAssetStore::new(temp.path());
        assert!(matches!(result.unwrap_err(), StoreError::InvalidPath(_)));
    }
}
