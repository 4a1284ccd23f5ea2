//! Cache module for storing acronym expansions in a local database
//!
//! The cache is split in two layers: a `CacheStore` boundary exposing the four
//! raw row operations (implemented by `SqliteStore`), and a `CacheAdapter` that
//! turns rows into records, computes staleness from insertion timestamps and
//! replaces the rows of an acronym after a network refresh.

mod adapter;
mod sqlite;
mod store;

pub use adapter::CacheAdapter;
pub use sqlite::SqliteStore;
pub use store::{CacheStore, StoreError, StoredRow};
