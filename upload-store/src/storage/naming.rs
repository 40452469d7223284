//! Stored-name generation and validation
//!
//! A stored name has the shape `<millis>-<name>` or, when that name was
//! already taken, `<millis>-<n>-<name>`. `<name>` is the client's file name
//! reduced to its last path component and restricted to `[A-Za-z0-9._-]`.

use super::types::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use std::fmt;

/// Longest sanitized name kept from the client's file name, in bytes
pub const MAX_NAME_LEN: usize = 200;

/// Longest extension preserved when a name has to be truncated
const MAX_EXTENSION_LEN: usize = 16;

/// Upper bound for any stored name accepted by lookups
const MAX_STORED_NAME_LEN: usize = 255;

/// Source of the millisecond timestamp embedded in stored names
pub trait Clock: Send + Sync + fmt::Debug {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;
}

/// Wall clock backed by [`chrono::Utc::now`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock pinned to a single instant
///
/// ```rust
/// use upload_store::storage::{Clock, FixedClock};
///
/// assert_eq!(FixedClock(1_700_000_000_000).now_millis(), 1_700_000_000_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

const fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}

/// Reduces an untrusted client file name to a safe single path component
///
/// Only the text after the last `/` or `\` is kept, disallowed characters are
/// replaced by `_`, leading dots are stripped and the result is capped at
/// [`MAX_NAME_LEN`] bytes (keeping a short extension when possible).
///
/// # Errors
///
/// Returns `StoreError::InvalidInput` if nothing usable remains.
///
/// # Examples
///
/// ```rust
/// use upload_store::storage::sanitize_filename;
///
/// assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "passwd");
/// assert_eq!(sanitize_filename("my photo.png").unwrap(), "my_photo.png");
/// assert!(sanitize_filename("..").is_err());
/// ```
pub fn sanitize_filename(raw: &str) -> StoreResult<String> {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    let replaced: String = last
        .chars()
        .map(|c| if is_allowed(c) { c } else { '_' })
        .collect();
    let trimmed = replaced.trim_start_matches('.');

    if trimmed.is_empty() {
        return Err(StoreError::InvalidInput(format!(
            "file name {raw:?} has no usable characters"
        )));
    }

    Ok(truncate(trimmed))
}

// Input is ASCII only, so byte slicing is on char boundaries.
fn truncate(name: &str) -> String {
    if name.len() <= MAX_NAME_LEN {
        return name.to_string();
    }

    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() <= MAX_EXTENSION_LEN => {
            let keep = MAX_NAME_LEN - ext.len() - 1;
            format!("{}.{ext}", &stem[..keep.min(stem.len())])
        }
        _ => name[..MAX_NAME_LEN].to_string(),
    }
}

/// Builds the stored name for a sanitized file name
///
/// `attempt` 0 yields `<millis>-<name>`; later attempts insert a counter so
/// that a name already taken within the same millisecond is never reused.
///
/// ```rust
/// use upload_store::storage::stored_name;
///
/// assert_eq!(stored_name(1_700_000_000_000, 0, "a.txt"), "1700000000000-a.txt");
/// assert_eq!(stored_name(1_700_000_000_000, 2, "a.txt"), "1700000000000-2-a.txt");
/// ```
#[must_use]
pub fn stored_name(millis: i64, attempt: u32, sanitized: &str) -> String {
    if attempt == 0 {
        format!("{millis}-{sanitized}")
    } else {
        format!("{millis}-{attempt}-{sanitized}")
    }
}

/// Checks that a stored name can be joined onto the uploads directory
///
/// # Errors
///
/// Returns `StoreError::InvalidPath` for empty, overlong, hidden or
/// non-conforming names.
pub fn validate_stored_name(name: &str) -> StoreResult<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_STORED_NAME_LEN
        && !name.starts_with('.')
        && name.chars().all(is_allowed);

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidPath(name.to_string()))
    }
}

/// Decodes the upload time from a stored name's timestamp prefix
#[must_use]
pub fn uploaded_at(stored: &str) -> Option<DateTime<Utc>> {
    let (prefix, _) = stored.split_once('-')?;
    let millis = prefix.parse::<i64>().ok()?;
    DateTime::from_timestamp_millis(millis)
}
