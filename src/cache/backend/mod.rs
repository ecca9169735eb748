//! Storage Backends
//!
//! The persisted-table contract every store runs on, plus the in-memory and
//! SQLite implementations.

mod memory;
mod sqlite;

use std::fmt::Debug;

use crate::cache::{Entry, LiveFilter};
use crate::error::StorageResult;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

// == Backend ==
/// A table of entries that hands out transactions.
pub trait Backend: Send + Sync + Debug {
    /// Opens a transaction. Nothing done through it persists until
    /// [`Transaction::commit`]; dropping it discards its writes.
    fn begin(&self) -> StorageResult<Box<dyn Transaction + '_>>;
}

// == Transaction ==
/// Entry-table operations scoped to one transaction.
///
/// Operations taking a [`LiveFilter`] only see entries that filter accepts.
pub trait Transaction {
    /// Point lookup among live entries.
    fn find(&mut self, key: &str, tag: &str, live: LiveFilter) -> StorageResult<Option<Entry>>;

    /// Inserts or replaces the entry with the same `(key, tag)`, live or not.
    fn upsert(&mut self, entry: Entry) -> StorageResult<()>;

    /// Removes the live entry, returning whether one was removed.
    fn delete(&mut self, key: &str, tag: &str, live: LiveFilter) -> StorageResult<bool>;

    /// Removes every entry, live or expired, under `tag` whose key starts with `prefix`.
    fn delete_by_prefix(&mut self, prefix: &str, tag: &str) -> StorageResult<usize>;

    /// Removes every entry the filter rejects.
    fn delete_all_expired(&mut self, live: LiveFilter) -> StorageResult<usize>;

    /// Live entries ordered by `(key, tag)` ascending. Each call re-reads the table.
    fn iterate_live(&mut self, live: LiveFilter) -> StorageResult<Vec<Entry>>;

    /// Unconditionally removes every entry.
    fn clear(&mut self) -> StorageResult<usize>;

    /// Makes every write in this transaction durable.
    fn commit(self: Box<Self>) -> StorageResult<()>;
}
