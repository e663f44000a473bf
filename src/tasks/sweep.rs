//! Expired-Entry Sweep Task
//!
//! Optional background task that purges expired entries from a fixed set of
//! collections. Expiry is otherwise detected lazily on lookup.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheEngine;

/// Spawns a background task that periodically purges expired entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps over `collections`. A collection that fails to load is
/// logged and skipped until the next sweep.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let engine = CacheEngine::new(Arc::new(MemoryStorage::new()));
/// let sweep_handle = spawn_sweep_task(engine.clone(), vec!["default cache".into()], 60);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(
    engine: CacheEngine,
    collections: Vec<String>,
    sweep_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep over {:?} every {} seconds",
            collections,
            interval.as_secs()
        );

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            for collection in &collections {
                match engine.purge_expired(collection) {
                    Ok(0) => debug!("Expiry sweep: nothing expired in '{}'", collection),
                    Ok(removed) => {
                        info!("Expiry sweep: removed {} entries from '{}'", removed, collection)
                    }
                    Err(e) => warn!("Expiry sweep skipped '{}': {}", collection, e),
                }
            }
        }
    })
}
