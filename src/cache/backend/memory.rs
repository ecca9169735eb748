//! In-memory backend
//!
//! An ordered map behind a mutex. Each transaction holds the lock; the first
//! change copies the map, and the copy replaces the shared one on commit.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDateTime;

use super::{Backend, Transaction};
use crate::cache::{Entry, EntryKey, LiveFilter};
use crate::error::{StorageError, StorageResult};

#[derive(Debug, Clone)]
struct Stored {
    value: Vec<u8>,
    expire: Option<NaiveDateTime>,
}

type Table = BTreeMap<EntryKey, Stored>;

// == Memory Backend ==
#[derive(Debug, Default)]
pub struct MemoryBackend {
    table: Mutex<Table>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of physically stored entries, expired ones included.
    pub fn stored_len(&self) -> StorageResult<usize> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Table>> {
        self.table.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl Backend for MemoryBackend {
    fn begin(&self) -> StorageResult<Box<dyn Transaction + '_>> {
        let guard = self.lock()?;
        Ok(Box::new(MemoryTransaction {
            guard,
            working: None,
        }))
    }
}

// == Memory Transaction ==
/// Reads go to the shared map until the first change, which takes a private
/// copy for the rest of the transaction.
struct MemoryTransaction<'a> {
    guard: MutexGuard<'a, Table>,
    working: Option<Table>,
}

impl MemoryTransaction<'_> {
    fn table(&self) -> &Table {
        self.working.as_ref().unwrap_or(&*self.guard)
    }

    fn table_mut(&mut self) -> &mut Table {
        let shared = &self.guard;
        self.working.get_or_insert_with(|| (**shared).clone())
    }

    fn remove_all(&mut self, doomed: Vec<EntryKey>) -> usize {
        if doomed.is_empty() {
            return 0;
        }
        let table = self.table_mut();
        for id in &doomed {
            table.remove(id);
        }
        doomed.len()
    }
}

fn to_entry(id: &EntryKey, stored: &Stored) -> Entry {
    Entry::new(id.key.clone(), id.tag.clone(), stored.value.clone(), stored.expire)
}

impl Transaction for MemoryTransaction<'_> {
    fn find(&mut self, key: &str, tag: &str, live: LiveFilter) -> StorageResult<Option<Entry>> {
        let id = EntryKey::new(key, tag);
        Ok(self
            .table()
            .get(&id)
            .filter(|stored| live.is_live(stored.expire))
            .map(|stored| to_entry(&id, stored)))
    }

    fn upsert(&mut self, entry: Entry) -> StorageResult<()> {
        self.table_mut().insert(
            EntryKey::new(entry.key, entry.tag),
            Stored {
                value: entry.value,
                expire: entry.expire,
            },
        );
        Ok(())
    }

    fn delete(&mut self, key: &str, tag: &str, live: LiveFilter) -> StorageResult<bool> {
        let id = EntryKey::new(key, tag);
        let present = self
            .table()
            .get(&id)
            .is_some_and(|stored| live.is_live(stored.expire));
        Ok(self.remove_all(if present { vec![id] } else { Vec::new() }) > 0)
    }

    fn delete_by_prefix(&mut self, prefix: &str, tag: &str) -> StorageResult<usize> {
        let doomed = self
            .table()
            .keys()
            .filter(|id| id.tag == tag && id.key.starts_with(prefix))
            .cloned()
            .collect();
        Ok(self.remove_all(doomed))
    }

    fn delete_all_expired(&mut self, live: LiveFilter) -> StorageResult<usize> {
        let doomed = self
            .table()
            .iter()
            .filter(|(_, stored)| !live.is_live(stored.expire))
            .map(|(id, _)| id.clone())
            .collect();
        Ok(self.remove_all(doomed))
    }

    fn iterate_live(&mut self, live: LiveFilter) -> StorageResult<Vec<Entry>> {
        Ok(self
            .table()
            .iter()
            .filter(|(_, stored)| live.is_live(stored.expire))
            .map(|(id, stored)| to_entry(id, stored))
            .collect())
    }

    fn clear(&mut self) -> StorageResult<usize> {
        let removed = self.table().len();
        self.working = Some(Table::new());
        Ok(removed)
    }

    fn commit(self: Box<Self>) -> StorageResult<()> {
        let MemoryTransaction { mut guard, working } = *self;
        if let Some(working) = working {
            *guard = working;
        }
        Ok(())
    }
}
