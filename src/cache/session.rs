//! Store Session Module
//!
//! A transaction plus the one `now` sample every operation inside it uses.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::cache::backend::{Backend, Transaction};
use crate::cache::{Clock, Entry, LiveFilter};
use crate::error::Result;

// == Session ==
/// Entry-table access scoped to a single transaction.
///
/// Every liveness check in a session is made against the instant sampled
/// when the session opened.
pub struct Session<'a> {
    txn: Box<dyn Transaction + 'a>,
    live: LiveFilter,
}

impl<'a> Session<'a> {
    /// The instant this session was opened at.
    pub fn now(&self) -> NaiveDateTime {
        self.live.now()
    }

    pub fn find(&mut self, key: &str, tag: &str) -> Result<Option<Entry>> {
        Ok(self.txn.find(key, tag, self.live)?)
    }

    pub fn upsert(&mut self, entry: Entry) -> Result<()> {
        Ok(self.txn.upsert(entry)?)
    }

    pub fn delete(&mut self, key: &str, tag: &str) -> Result<bool> {
        Ok(self.txn.delete(key, tag, self.live)?)
    }

    pub fn delete_by_prefix(&mut self, prefix: &str, tag: &str) -> Result<usize> {
        Ok(self.txn.delete_by_prefix(prefix, tag)?)
    }

    pub fn delete_all_expired(&mut self) -> Result<usize> {
        Ok(self.txn.delete_all_expired(self.live)?)
    }

    pub fn iterate_live(&mut self) -> Result<Vec<Entry>> {
        Ok(self.txn.iterate_live(self.live)?)
    }

    pub fn clear(&mut self) -> Result<usize> {
        Ok(self.txn.clear()?)
    }
}

// == Run Session ==
/// Runs `body` inside a fresh transaction.
///
/// On success with `commit`, expired entries are swept first (when
/// `sweep_expired`) and the transaction is committed. Without `commit`, or
/// when `body` fails, the transaction is dropped and nothing persists.
pub(crate) fn run<T>(
    backend: &dyn Backend,
    clock: &dyn Clock,
    commit: bool,
    sweep_expired: bool,
    body: impl FnOnce(&mut Session<'_>) -> Result<T>,
) -> Result<T> {
    let mut session = Session {
        txn: backend.begin()?,
        live: LiveFilter::at(clock.now()),
    };

    let output = body(&mut session)?;

    if commit {
        if sweep_expired {
            let swept = session.delete_all_expired()?;
            if swept > 0 {
                debug!(swept, "swept expired entries");
            }
        }
        session.txn.commit()?;
    }

    Ok(output)
}
