//! Proxy Module
//!
//! A handle bound to one `(key, tag)` that reads and writes through the store.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{Expiration, KvStore};
use crate::error::Result;

// == Proxy ==
/// Lazy accessor for a single entry. Holds no value of its own; every read
/// goes to the store.
#[derive(Debug, Clone)]
pub struct Proxy<T> {
    store: KvStore,
    key: String,
    tag: String,
    default: Option<T>,
}

impl<T> Proxy<T> {
    pub(crate) fn new(store: KvStore, key: &str, tag: &str, default: Option<T>) -> Self {
        Self {
            store,
            key: key.to_string(),
            tag: tag.to_string(),
            default,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl<T> Proxy<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Current value, the default if nothing live is stored, else `KeyNotFound`.
    pub fn get(&self) -> Result<T> {
        match &self.default {
            Some(default) => self.store.get_or(&self.key, &self.tag, default.clone()),
            None => self.store.get(&self.key, &self.tag),
        }
    }

    /// Writes a never-expiring value.
    pub fn set(&self, value: &T) -> Result<()> {
        self.set_with_expiration(value, Expiration::Never)
    }

    pub fn set_with_expiration(&self, value: &T, expire: impl Into<Expiration>) -> Result<()> {
        self.store.set(&self.key, value, &self.tag, expire)
    }

    pub fn delete(&self) -> Result<()> {
        self.store.delete(&self.key, &self.tag)
    }
}
