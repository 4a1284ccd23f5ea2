//! Cache adapter turning stored rows into acronym records
//!
//! Provides a `CacheAdapter` that reads records with a staleness flag derived
//! from the oldest insertion timestamp, and replaces the rows of an acronym
//! wholesale after a refresh.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use super::store::{CacheStore, StoreError, StoredRow};
use crate::data::{AcronymRecord, ResolutionResult, StatusKind};

/// Reads and writes acronym records through a `CacheStore`
#[derive(Clone)]
pub struct CacheAdapter {
    store: Arc<dyn CacheStore>,
}

impl CacheAdapter {
    /// Creates an adapter over `store`
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Looks up cached records
    ///
    /// # Arguments
    /// * `name` - Exact acronym to look up, or `None` for every cached record
    /// * `ttl` - Maximum age before the rows count as stale; zero disables the check
    ///
    /// # Returns
    /// * `Ok` with the records (possibly empty) and `is_stale` set when the
    ///   oldest matching row is older than `ttl`
    /// * `StorageFailure` if the store could not be queried
    pub fn lookup(&self, name: Option<&str>, ttl: Duration) -> ResolutionResult {
        let rows = match self.store.query(name) {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Failed to query cache for {:?}: {}", name, e);
                return ResolutionResult::failure(StatusKind::StorageFailure);
            }
        };

        if rows.is_empty() {
            debug!("No cached result for {:?}", name);
            return ResolutionResult::success(Vec::new());
        }

        // Listing everything never checks staleness
        let ttl = if name.is_some() { ttl } else { Duration::ZERO };
        let oldest = rows.iter().map(|row| row.inserted_at).min().unwrap_or(i64::MAX);
        let is_stale = is_older_than(oldest, ttl, Utc::now().timestamp_millis());

        debug!(
            "{} cached result(s) for {:?}{}",
            rows.len(),
            name,
            if is_stale { " (stale)" } else { "" }
        );

        let records = rows
            .into_iter()
            .map(|row| AcronymRecord::new(row.name, row.expansion).with_comment(row.comment))
            .collect();

        ResolutionResult::success(records).with_stale(is_stale)
    }

    /// Replaces every cached row for `name` with `records`
    ///
    /// Rows for `name` and for any other name appearing in `records` are
    /// deleted first, so calling this twice leaves a single copy of each record.
    /// The store applies the deletes and inserts as one unit where it can.
    pub fn replace(&self, name: &str, records: &[AcronymRecord]) -> Result<(), StoreError> {
        let mut names: BTreeSet<&str> = records.iter().map(|r| r.name.as_str()).collect();
        names.insert(name);
        let names: Vec<&str> = names.into_iter().collect();

        let inserted_at = Utc::now().timestamp_millis();
        let rows: Vec<StoredRow> = records
            .iter()
            .map(|record| StoredRow {
                name: record.name.clone(),
                expansion: record.expansion.clone(),
                comment: record.comment.clone().filter(|c| !c.is_empty()),
                inserted_at,
            })
            .collect();

        let deleted = self.store.replace_rows(&names, &rows)?;

        debug!(
            "Replaced cache for {}: {} row(s) deleted, {} inserted",
            name,
            deleted,
            rows.len()
        );
        Ok(())
    }

    /// Deletes every cached row, returning how many were removed
    pub fn clear_all(&self) -> Result<usize, StoreError> {
        let deleted = self.store.delete_all()?;
        debug!("{} row(s) deleted from cache", deleted);
        Ok(deleted)
    }
}

/// True when `inserted_at` (epoch ms) is more than `ttl` before `now` (epoch ms)
fn is_older_than(inserted_at: i64, ttl: Duration, now: i64) -> bool {
    if ttl.is_zero() {
        return false;
    }
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    inserted_at.saturating_add(ttl_ms) < now
}
