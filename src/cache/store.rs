//! Key/Value Store Module
//!
//! The public facade: every operation opens a session on the backend, works
//! on the entry table and commits (sweeping expired rows) or discards.

use std::panic::Location;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::backend::{Backend, MemoryBackend, SqliteBackend};
use crate::cache::session::{self, Session};
use crate::cache::{Clock, Entry, EntryKey, Expiration, Memoized, Proxy, SystemClock};
use crate::error::{Error, Result};

/// Iterator over live keys, ordered by `(key, tag)`.
pub type Keys = std::vec::IntoIter<EntryKey>;

// == KvStore ==
/// Handle to a persisted key/value table with per-entry expiration.
///
/// Cloning is cheap; clones share the backend and clock.
#[derive(Debug, Clone)]
pub struct KvStore {
    backend: Arc<dyn Backend>,
    clock: Arc<dyn Clock>,
}

impl KvStore {
    // == Constructors ==
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self::from_parts(Arc::new(backend), Arc::new(SystemClock))
    }

    pub fn with_clock(backend: impl Backend + 'static, clock: impl Clock + 'static) -> Self {
        Self::from_parts(Arc::new(backend), Arc::new(clock))
    }

    /// Builds a store over shared handles, e.g. to keep a test hook on the clock.
    pub fn from_parts(backend: Arc<dyn Backend>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// A store backed by a process-local map.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// A store backed by the SQLite database at `path`.
    pub fn open_sqlite(path: impl AsRef<Path>, create_schema: bool) -> Result<Self> {
        Ok(Self::new(SqliteBackend::open(path, create_schema)?))
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    // == Session ==
    /// Runs `body` in one transaction.
    ///
    /// With `commit`, expired entries are swept (if `sweep_expired`) and the
    /// transaction committed after `body` succeeds. Without it nothing `body`
    /// writes persists. A failing `body` never persists anything.
    pub fn session<T>(
        &self,
        commit: bool,
        sweep_expired: bool,
        body: impl FnOnce(&mut Session<'_>) -> Result<T>,
    ) -> Result<T> {
        session::run(
            self.backend.as_ref(),
            self.clock.as_ref(),
            commit,
            sweep_expired,
            body,
        )
    }

    // == Get ==
    /// Returns the live value for `(key, tag)`, or `KeyNotFound`.
    pub fn get<V: DeserializeOwned>(&self, key: &str, tag: &str) -> Result<V> {
        self.get_with_expiration(key, tag).map(|(value, _)| value)
    }

    /// Like [`KvStore::get`] but returns `default` when nothing live is stored.
    pub fn get_or<V: DeserializeOwned>(&self, key: &str, tag: &str, default: V) -> Result<V> {
        match self.get(key, tag) {
            Err(err) if err.is_not_found() => Ok(default),
            other => other,
        }
    }

    /// Returns the live value together with its expiration instant, if any.
    pub fn get_with_expiration<V: DeserializeOwned>(
        &self,
        key: &str,
        tag: &str,
    ) -> Result<(V, Option<NaiveDateTime>)> {
        let entry = self
            .session(true, true, |s| s.find(key, tag))?
            .ok_or_else(|| Error::not_found(key, tag))?;

        let value = serde_json::from_slice(&entry.value)?;
        Ok((value, entry.expire))
    }

    // == Set ==
    /// Stores `value` under `(key, tag)`, replacing whatever was there.
    pub fn set<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
        tag: &str,
        expire: impl Into<Expiration>,
    ) -> Result<()> {
        let value = serde_json::to_vec(value)?;
        let expire = expire.into();

        self.session(true, true, |s| {
            let expire = expire.resolve(s.now())?;
            s.upsert(Entry::new(key, tag, value, expire))
        })
    }

    // == Delete ==
    /// Removes the live entry for `(key, tag)`. Missing entries are fine.
    pub fn delete(&self, key: &str, tag: &str) -> Result<()> {
        self.session(true, true, |s| s.delete(key, tag)).map(|_| ())
    }

    // == Pop ==
    /// Returns and removes the live value for `(key, tag)`.
    ///
    /// This is a `get` followed by a `delete` in two separate sessions. A
    /// concurrent writer can overwrite or remove the entry in between; the
    /// value returned is the one read, and the delete removes whatever is
    /// live at that point.
    pub fn pop<V: DeserializeOwned>(&self, key: &str, tag: &str) -> Result<V> {
        let value = self.get(key, tag)?;
        self.delete(key, tag)?;
        Ok(value)
    }

    /// Like [`KvStore::pop`] but returns `default`, touching nothing, when
    /// nothing live is stored.
    pub fn pop_or<V: DeserializeOwned>(&self, key: &str, tag: &str, default: V) -> Result<V> {
        match self.pop(key, tag) {
            Err(err) if err.is_not_found() => Ok(default),
            other => other,
        }
    }

    // == Clear ==
    /// Removes every entry, expired or not.
    pub fn clear(&self) -> Result<()> {
        let removed = self.session(true, true, |s| s.clear())?;
        debug!(removed, "cleared store");
        Ok(())
    }

    // == Enumeration ==
    /// Live keys ordered by `(key, tag)`.
    ///
    /// Reads in a read-only session, so no sweep runs. Each call re-queries.
    pub fn keys(&self) -> Result<Keys> {
        let entries = self.session(false, false, |s| s.iterate_live())?;
        Ok(entries
            .into_iter()
            .map(|e| EntryKey::new(e.key, e.tag))
            .collect::<Vec<_>>()
            .into_iter())
    }

    /// Live keys with their expiration instants, ordered by `(key, tag)`.
    pub fn entries(&self) -> Result<Vec<(EntryKey, Option<NaiveDateTime>)>> {
        let entries = self.session(false, false, |s| s.iterate_live())?;
        Ok(entries
            .into_iter()
            .map(|e| (EntryKey::new(e.key, e.tag), e.expire))
            .collect())
    }

    /// Number of live entries.
    pub fn len(&self) -> Result<usize> {
        Ok(self.keys()?.count())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // == Sweep ==
    /// Physically removes every expired entry now. Returns how many went.
    pub fn sweep_expired(&self) -> Result<usize> {
        self.session(true, false, |s| s.delete_all_expired())
    }

    // == Prefix Delete ==
    /// Removes every entry under `tag` whose key starts with `prefix`,
    /// expired or not.
    pub(crate) fn delete_prefix(&self, prefix: &str, tag: &str) -> Result<usize> {
        let removed = self.session(true, true, |s| s.delete_by_prefix(prefix, tag))?;
        debug!(prefix, tag, removed, "deleted entries by prefix");
        Ok(removed)
    }

    // == Proxy ==
    /// A handle bound to one `(key, tag)`.
    pub fn proxy<T>(&self, key: &str, tag: &str, default: Option<T>) -> Proxy<T> {
        Proxy::new(self.clone(), key, tag, default)
    }

    // == Memoize ==
    /// Wraps `func` so repeated calls with equal arguments reuse a stored result.
    ///
    /// See [`Memoized`] for the options. An unnamed closure is identified by
    /// its type name plus the location of this call.
    #[track_caller]
    pub fn memoize<A, R, F>(&self, func: F) -> Memoized<A, R, F>
    where
        A: Serialize,
        R: Serialize + DeserializeOwned,
        F: Fn(A) -> R,
    {
        Memoized::new(self.clone(), func, Location::caller())
    }
}
