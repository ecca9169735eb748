//! Cache Entry Module
//!
//! Defines the stored record and the liveness predicate shared by every backend.

use chrono::{NaiveDateTime, SubsecRound};
use serde::Serialize;

/// Fractional-second digits kept on every stored or compared instant.
/// Matches the integer-microsecond column of the SQLite backend.
pub(crate) const TIMESTAMP_PRECISION: u16 = 6;

/// Drops sub-microsecond precision so that every backend stores and compares
/// the same instant.
pub(crate) fn to_storage_precision(at: NaiveDateTime) -> NaiveDateTime {
    at.trunc_subsecs(TIMESTAMP_PRECISION)
}

// == Entry Key ==
/// The `(key, tag)` identity of an entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntryKey {
    pub key: String,
    pub tag: String,
}

impl EntryKey {
    pub fn new(key: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            tag: tag.into(),
        }
    }
}

// == Entry ==
/// A single stored record: identity, serialized value and optional expiration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The stored key
    pub key: String,
    /// Namespace discriminator, empty by default
    pub tag: String,
    /// Serialized value payload
    pub value: Vec<u8>,
    /// Expiration instant (naive UTC, microsecond precision), None = never expires
    pub expire: Option<NaiveDateTime>,
}

impl Entry {
    // == Constructor ==
    pub fn new(
        key: impl Into<String>,
        tag: impl Into<String>,
        value: Vec<u8>,
        expire: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            key: key.into(),
            tag: tag.into(),
            value,
            expire: expire.map(to_storage_precision),
        }
    }

    /// Returns the `(key, tag)` identity.
    pub fn identity(&self) -> EntryKey {
        EntryKey::new(self.key.clone(), self.tag.clone())
    }
}

// == Live Filter ==
/// The one definition of "this entry is alive": expire is absent or strictly
/// after the instant being checked.
///
/// Backends evaluating in-process use [`LiveFilter::matches`]; SQL backends
/// splice [`LiveFilter::SQL`] into their statements and bind [`LiveFilter::now`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveFilter {
    now: NaiveDateTime,
}

impl LiveFilter {
    /// SQL form of the predicate. The single placeholder binds `now`.
    pub const SQL: &'static str = "(expire IS NULL OR expire > ?)";

    /// A filter evaluated at `now`, truncated to storage precision.
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now: to_storage_precision(now),
        }
    }

    /// The instant the predicate is evaluated against.
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn is_live(&self, expire: Option<NaiveDateTime>) -> bool {
        match expire {
            Some(expire) => expire > self.now,
            None => true,
        }
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        self.is_live(entry.expire)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_entry_without_expire_is_always_live() {
        let entry = Entry::new("k", "", b"1".to_vec(), None);
        let far_future = noon() + TimeDelta::days(365 * 100);

        assert!(LiveFilter::at(noon()).matches(&entry));
        assert!(LiveFilter::at(far_future).matches(&entry));
    }

    #[test]
    fn test_future_expire_is_live() {
        let entry = Entry::new("k", "", b"1".to_vec(), Some(noon() + TimeDelta::seconds(1)));
        assert!(LiveFilter::at(noon()).matches(&entry));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        // Expiring exactly at the checked instant counts as dead
        let entry = Entry::new("k", "", b"1".to_vec(), Some(noon()));
        assert!(!LiveFilter::at(noon()).matches(&entry));
    }

    #[test]
    fn test_past_expire_is_dead() {
        let entry = Entry::new("k", "", b"1".to_vec(), Some(noon() - TimeDelta::seconds(1)));
        assert!(!LiveFilter::at(noon()).matches(&entry));
    }

    #[test]
    fn test_entry_keys_order_by_key_then_tag() {
        let mut keys = vec![
            EntryKey::new("b", ""),
            EntryKey::new("a", "z"),
            EntryKey::new("a", ""),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                EntryKey::new("a", ""),
                EntryKey::new("a", "z"),
                EntryKey::new("b", ""),
            ]
        );
    }

    #[test]
    fn test_instants_are_truncated_to_micros() {
        let at = noon() + TimeDelta::nanoseconds(1_234_567);
        let micros = noon() + TimeDelta::microseconds(1_234);

        let entry = Entry::new("k", "", b"1".to_vec(), Some(at));
        assert_eq!(entry.expire, Some(micros));
        assert_eq!(LiveFilter::at(at).now(), micros);
    }

    #[test]
    fn test_sub_micro_difference_is_not_live() {
        // Both sides truncate to the same microsecond, so the entry is dead
        let entry = Entry::new("k", "", b"1".to_vec(), Some(noon() + TimeDelta::nanoseconds(900)));
        assert!(!LiveFilter::at(noon() + TimeDelta::nanoseconds(100)).matches(&entry));
    }
}
