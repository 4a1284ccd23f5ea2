//! Storage boundary used by the cache adapter.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by a cache store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database rejected an operation
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The connection lock was poisoned by a panicking thread
    #[error("Cache database lock poisoned")]
    LockPoisoned,

    /// The database directory could not be created
    #[error("Failed to create cache directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One stored expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub name: String,
    pub expansion: String,
    /// `None` when the record had no comment
    pub comment: Option<String>,
    /// Insertion time in milliseconds since the Unix epoch
    pub inserted_at: i64,
}

/// Key-indexed table of expansions.
///
/// Names are matched exactly (case-sensitive). All operations are synchronous.
pub trait CacheStore: Send + Sync {
    /// Returns the rows for `name`, or every row when `name` is `None`.
    fn query(&self, name: Option<&str>) -> Result<Vec<StoredRow>, StoreError>;

    /// Inserts one row.
    fn insert(&self, row: &StoredRow) -> Result<(), StoreError>;

    /// Deletes every row for `name`, returning how many were removed.
    fn delete_by_name(&self, name: &str) -> Result<usize, StoreError>;

    /// Deletes every row, returning how many were removed.
    fn delete_all(&self) -> Result<usize, StoreError>;

    /// Deletes every row for each of `names`, then inserts `rows`.
    ///
    /// Returns how many rows were deleted. The default runs the deletes and
    /// inserts one by one; stores that can should apply them atomically.
    fn replace_rows(&self, names: &[&str], rows: &[StoredRow]) -> Result<usize, StoreError> {
        let mut deleted = 0;
        for name in names {
            deleted += self.delete_by_name(name)?;
        }
        for row in rows {
            self.insert(row)?;
        }
        Ok(deleted)
    }
}
