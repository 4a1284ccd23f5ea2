//! SQLite-backed cache store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};
use tracing::debug;

use super::store::{CacheStore, StoreError, StoredRow};

/// Cache store backed by a single SQLite database.
///
/// Thread-safe via an internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `db_path`.
    ///
    /// Creates the parent directory and the schema if they don't exist.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        debug!("Opened cache database at {}", db_path.display());

        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS acronym (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                expansion TEXT NOT NULL,
                comment TEXT,
                inserted INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_acronym_name ON acronym(name);
            "#,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl CacheStore for SqliteStore {
    fn query(&self, name: Option<&str>) -> Result<Vec<StoredRow>, StoreError> {
        let conn = self.lock()?;

        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<StoredRow> {
            Ok(StoredRow {
                name: row.get(0)?,
                expansion: row.get(1)?,
                comment: row.get(2)?,
                inserted_at: row.get(3)?,
            })
        };

        let rows = match name {
            Some(name) => {
                let mut stmt = conn.prepare(
                    "SELECT name, expansion, comment, inserted FROM acronym WHERE name = ?1 ORDER BY id",
                )?;
                let rows = stmt.query_map(params![name], map_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT name, expansion, comment, inserted FROM acronym ORDER BY id",
                )?;
                let rows = stmt.query_map([], map_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(rows)
    }

    fn insert(&self, row: &StoredRow) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO acronym (name, expansion, comment, inserted) VALUES (?1, ?2, ?3, ?4)",
            params![row.name, row.expansion, row.comment, row.inserted_at],
        )?;
        Ok(())
    }

    fn delete_by_name(&self, name: &str) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM acronym WHERE name = ?1", params![name])?;
        Ok(deleted)
    }

    fn delete_all(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM acronym", [])?;
        Ok(deleted)
    }

    fn replace_rows(&self, names: &[&str], rows: &[StoredRow]) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut deleted = 0;
        for name in names {
            deleted += tx.execute("DELETE FROM acronym WHERE name = ?1", params![name])?;
        }
        for row in rows {
            tx.execute(
                "INSERT INTO acronym (name, expansion, comment, inserted) VALUES (?1, ?2, ?3, ?4)",
                params![row.name, row.expansion, row.comment, row.inserted_at],
            )?;
        }

        // Dropping `tx` on an early return rolls everything back
        tx.commit()?;
        Ok(deleted)
    }
}
