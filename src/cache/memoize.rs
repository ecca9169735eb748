//! Memoization Module
//!
//! Caches a function's results in a [`KvStore`] under a reserved tag, keyed by
//! the function's identity and a canonical encoding of its arguments.

use std::fmt;
use std::marker::PhantomData;
use std::panic::Location;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cache::{Expiration, KvStore, MemoStats};
use crate::error::Result;

/// Tag reserved for memoized results, keeping them apart from entries
/// written directly through the store.
pub const MEMOIZE_TAG: &str = "__memoize__";

/// Either a fixed answer or a predicate asked on every call.
enum Trigger<P: ?Sized> {
    Fixed(bool),
    When(Box<P>),
}

type RefreshPredicate = dyn Fn() -> bool + Send + Sync;
type SkipPredicate<R> = dyn Fn(&R) -> bool + Send + Sync;

// == Memoized ==
/// A function wrapped with a store-backed result cache.
///
/// Arguments are passed as one value; use a tuple for several. They must
/// serialize deterministically: maps are key-sorted here, but types whose
/// serialized order varies between runs (such as `HashSet`) should be
/// replaced with ordered ones.
///
/// Concurrent calls with equal arguments may all miss and all compute; the
/// last write wins.
pub struct Memoized<A, R, F> {
    store: KvStore,
    func: F,
    name: String,
    expire: Expiration,
    base_key: String,
    force_refresh: Trigger<RefreshPredicate>,
    skip_saving: Trigger<SkipPredicate<R>>,
    stats: Mutex<MemoStats>,
    _signature: PhantomData<fn(A) -> R>,
}

impl<A, R, F> Memoized<A, R, F>
where
    A: Serialize,
    R: Serialize + DeserializeOwned,
    F: Fn(A) -> R,
{
    pub(crate) fn new(store: KvStore, func: F, caller: &'static Location<'static>) -> Self {
        let name = default_name::<F>(caller);
        let expire = Expiration::Never;
        Self {
            store,
            func,
            base_key: base_key(&name, &expire),
            name,
            expire,
            force_refresh: Trigger::Fixed(false),
            skip_saving: Trigger::Fixed(false),
            stats: Mutex::new(MemoStats::new()),
            _signature: PhantomData,
        }
    }

    // == Options ==
    /// Overrides the identity derived from the function's type name.
    ///
    /// Closures otherwise take the source location of the `memoize` call as
    /// part of their identity, so moving that call orphans stored results.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.base_key = base_key(&self.name, &self.expire);
        self
    }

    /// Expiration applied to every stored result.
    pub fn expire(mut self, expire: impl Into<Expiration>) -> Self {
        self.expire = expire.into();
        self.base_key = base_key(&self.name, &self.expire);
        self
    }

    /// When true, every call skips the lookup and recomputes.
    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = Trigger::Fixed(force);
        self
    }

    /// Asks `predicate` on every call whether to skip the lookup and recompute.
    pub fn force_refresh_when(
        mut self,
        predicate: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Self {
        self.force_refresh = Trigger::When(Box::new(predicate));
        self
    }

    /// When true, computed results are returned but never stored.
    pub fn skip_saving_if(mut self, skip: bool) -> Self {
        self.skip_saving = Trigger::Fixed(skip);
        self
    }

    /// Asks `predicate` about each computed result whether to leave it unstored.
    pub fn skip_saving_when(
        mut self,
        predicate: impl Fn(&R) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.skip_saving = Trigger::When(Box::new(predicate));
        self
    }

    // == Call ==
    /// Returns the stored result for `args`, computing and storing it on a miss.
    ///
    /// A missing entry is a miss; every other store failure is returned.
    pub fn call(&self, args: A) -> Result<R> {
        let key = self.cache_key(&args)?;

        let forced = match &self.force_refresh {
            Trigger::Fixed(force) => *force,
            Trigger::When(predicate) => predicate(),
        };

        if forced {
            debug!(key = %key, "force refresh is bypassing the cache");
            self.record(MemoStats::record_forced_refresh);
        } else {
            match self.store.get::<R>(&key, MEMOIZE_TAG) {
                Ok(cached) => {
                    self.record(MemoStats::record_hit);
                    return Ok(cached);
                }
                Err(err) if err.is_not_found() => self.record(MemoStats::record_miss),
                Err(err) => return Err(err),
            }
        }

        let result = (self.func)(args);

        let skip = match &self.skip_saving {
            Trigger::Fixed(skip) => *skip,
            Trigger::When(predicate) => predicate(&result),
        };

        if skip {
            debug!(key = %key, "not saving result to the cache");
            self.record(MemoStats::record_skipped_save);
        } else {
            self.store.set(&key, &result, MEMOIZE_TAG, self.expire)?;
        }

        Ok(result)
    }

    /// Removes every stored result of this function, whatever the arguments.
    pub fn cache_clear(&self) -> Result<usize> {
        self.store.delete_prefix(&self.base_key, MEMOIZE_TAG)
    }

    /// The store key `args` map to.
    pub fn cache_key(&self, args: &A) -> Result<String> {
        let encoded = serde_json::to_string(&canonical(serde_json::to_value(args)?))?;
        Ok(format!("{}{}", self.base_key, encoded))
    }

    /// Prefix shared by every key of this function.
    pub fn base_key(&self) -> &str {
        &self.base_key
    }

    pub fn stats(&self) -> MemoStats {
        self.stats
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record(&self, update: fn(&mut MemoStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        update(&mut stats);
    }
}

impl<A, R, F> fmt::Debug for Memoized<A, R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("base_key", &self.base_key)
            .finish_non_exhaustive()
    }
}

/// Type name for named functions. Every closure in a function shares the
/// type name `path::{{closure}}`, so closures also get the call site.
fn default_name<F>(caller: &Location<'_>) -> String {
    let type_name = std::any::type_name::<F>();
    if type_name.contains("{{closure}}") {
        format!(
            "{type_name}@{}:{}:{}",
            caller.file(),
            caller.line(),
            caller.column()
        )
    } else {
        type_name.to_string()
    }
}

/// `memoize.<name>[<expire>]`, with `\` and `]` escaped in the name.
///
/// The first unescaped `]` ends the base key, so no base key is a prefix of
/// another function's keys.
fn base_key(name: &str, expire: &Expiration) -> String {
    let escaped = name.replace('\\', "\\\\").replace(']', "\\]");
    format!("memoize.{escaped}[{expire}]")
}

/// Rebuilds objects with their keys in sorted order, at every depth.
fn canonical(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<(String, Value)> = map.into_iter().collect();
            fields.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, canonical(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonical).collect()),
        other => other,
    }
}
