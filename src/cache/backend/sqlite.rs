//! SQLite backend
//!
//! Entries live in a single `kvstore` table keyed by `(key, tag)`. Expiration
//! is stored as microseconds since the Unix epoch so that comparisons are
//! plain integer comparisons.

use std::fmt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Backend, Transaction};
use crate::cache::{Entry, LiveFilter};
use crate::error::{StorageError, StorageResult};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS kvstore (
    key    TEXT NOT NULL,
    tag    TEXT NOT NULL DEFAULT '',
    value  BLOB NOT NULL,
    expire INTEGER,
    PRIMARY KEY (key, tag)
);
CREATE INDEX IF NOT EXISTS kvstore_expire ON kvstore (expire);
";

// == SQLite Backend ==
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteBackend").finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Opens (or creates) the database file at `path`.
    ///
    /// With `create_schema` false the `kvstore` table must already exist.
    pub fn open(path: impl AsRef<Path>, create_schema: bool) -> StorageResult<Self> {
        Self::from_connection(Connection::open(path)?, create_schema)
    }

    /// A private in-memory database with the schema in place.
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, true)
    }

    pub fn from_connection(conn: Connection, create_schema: bool) -> StorageResult<Self> {
        let backend = Self {
            conn: Mutex::new(conn),
        };
        if create_schema {
            backend.create_schema()?;
        }
        Ok(backend)
    }

    /// Creates the `kvstore` table and its expiration index if missing.
    pub fn create_schema(&self) -> StorageResult<()> {
        self.lock()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Number of physically stored rows, expired ones included.
    pub fn stored_len(&self) -> StorageResult<usize> {
        let count: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM kvstore", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl Backend for SqliteBackend {
    fn begin(&self) -> StorageResult<Box<dyn Transaction + '_>> {
        let conn = self.lock()?;
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Box::new(SqliteTransaction {
            conn,
            finished: false,
        }))
    }
}

// == Timestamp Encoding ==
fn to_micros(at: NaiveDateTime) -> i64 {
    at.and_utc().timestamp_micros()
}

fn from_micros(column: usize, micros: i64) -> rusqlite::Result<NaiveDateTime> {
    DateTime::from_timestamp_micros(micros)
        .map(|at| at.naive_utc())
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(column, micros))
}

fn read_entry(row: &Row<'_>) -> rusqlite::Result<Entry> {
    let expire = row
        .get::<_, Option<i64>>(3)?
        .map(|micros| from_micros(3, micros))
        .transpose()?;
    Ok(Entry::new(
        row.get::<_, String>(0)?,
        row.get::<_, String>(1)?,
        row.get::<_, Vec<u8>>(2)?,
        expire,
    ))
}

// == SQLite Transaction ==
/// Rolls back on drop unless committed.
struct SqliteTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(err) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!(error = %err, "sqlite rollback failed");
            }
        }
    }
}

impl Transaction for SqliteTransaction<'_> {
    fn find(&mut self, key: &str, tag: &str, live: LiveFilter) -> StorageResult<Option<Entry>> {
        let sql = format!(
            "SELECT key, tag, value, expire FROM kvstore WHERE key = ? AND tag = ? AND {}",
            LiveFilter::SQL
        );
        let entry = self
            .conn
            .prepare_cached(&sql)?
            .query_row(params![key, tag, to_micros(live.now())], read_entry)
            .optional()?;
        Ok(entry)
    }

    fn upsert(&mut self, entry: Entry) -> StorageResult<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO kvstore (key, tag, value, expire) VALUES (?, ?, ?, ?)
                 ON CONFLICT (key, tag) DO UPDATE SET value = excluded.value, expire = excluded.expire",
            )?
            .execute(params![
                entry.key,
                entry.tag,
                entry.value,
                entry.expire.map(to_micros)
            ])?;
        Ok(())
    }

    fn delete(&mut self, key: &str, tag: &str, live: LiveFilter) -> StorageResult<bool> {
        let sql = format!(
            "DELETE FROM kvstore WHERE key = ? AND tag = ? AND {}",
            LiveFilter::SQL
        );
        let removed = self
            .conn
            .prepare_cached(&sql)?
            .execute(params![key, tag, to_micros(live.now())])?;
        Ok(removed > 0)
    }

    fn delete_by_prefix(&mut self, prefix: &str, tag: &str) -> StorageResult<usize> {
        // substr/length rather than LIKE so that '%' and '_' in keys stay literal
        let removed = self
            .conn
            .prepare_cached(
                "DELETE FROM kvstore WHERE tag = ? AND substr(key, 1, length(?)) = ?",
            )?
            .execute(params![tag, prefix, prefix])?;
        Ok(removed)
    }

    fn delete_all_expired(&mut self, live: LiveFilter) -> StorageResult<usize> {
        let sql = format!("DELETE FROM kvstore WHERE NOT {}", LiveFilter::SQL);
        let removed = self
            .conn
            .prepare_cached(&sql)?
            .execute(params![to_micros(live.now())])?;
        Ok(removed)
    }

    fn iterate_live(&mut self, live: LiveFilter) -> StorageResult<Vec<Entry>> {
        let sql = format!(
            "SELECT key, tag, value, expire FROM kvstore WHERE {} ORDER BY key ASC, tag ASC",
            LiveFilter::SQL
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let entries = stmt
            .query_map(params![to_micros(live.now())], read_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn clear(&mut self) -> StorageResult<usize> {
        Ok(self.conn.execute("DELETE FROM kvstore", [])?)
    }

    fn commit(mut self: Box<Self>) -> StorageResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }
}
