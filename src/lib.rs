//! kvstash - A persistence-backed key/value cache
//!
//! Entries carry an optional expiration; expired entries are invisible to
//! reads and swept when writes commit. A memoizer caches function results in
//! the same table under a reserved tag.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{Expiration, KvStore, Memoized, Proxy, MEMOIZE_TAG};
pub use config::Config;
pub use error::{Error, Result};
pub use tasks::spawn_sweep_task;
