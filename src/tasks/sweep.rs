//! Expired-Entry Sweep Task
//!
//! Writes already sweep expired rows when they commit. A store that is only
//! read never commits, so the server can also sweep on a timer.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::KvStore;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. Each sweep runs on the blocking pool. A failed sweep is
/// logged and the loop carries on.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let store = KvStore::in_memory();
/// let sweep_handle = spawn_sweep_task(store.clone(), 60);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(store: KvStore, sweep_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expired-entry sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let store = store.clone();
            match tokio::task::spawn_blocking(move || store.sweep_expired()).await {
                Ok(Ok(removed)) if removed > 0 => {
                    info!("Sweep: removed {} expired entries", removed)
                }
                Ok(Ok(_)) => debug!("Sweep: no expired entries found"),
                Ok(Err(err)) => warn!(error = %err, "Sweep failed"),
                Err(err) => warn!(error = %err, "Sweep task panicked"),
            }
        }
    })
}
