//! Cache Module
//!
//! Persistence-backed key/value caching with per-entry expiration, plus
//! function memoization on top of it.

pub mod backend;
mod clock;
mod entry;
mod expiration;
mod memoize;
mod proxy;
mod session;
mod stats;
mod store;


// Re-export public types
pub use backend::{Backend, MemoryBackend, SqliteBackend, Transaction};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{Entry, EntryKey, LiveFilter};
pub use expiration::Expiration;
pub use memoize::{Memoized, MEMOIZE_TAG};
pub use proxy::Proxy;
pub use session::Session;
pub use stats::MemoStats;
pub use store::{Keys, KvStore};

// == Public Constants ==
/// Tag used when the caller has no namespace in mind.
pub const DEFAULT_TAG: &str = "";
