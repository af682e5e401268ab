use tracing::info;

use crate::store::{LocalStore, StoreResult};

/// Compact `store` if its log holds more than `threshold` entries beyond the
/// last compaction, counting any backlog found at open. Returns whether it
/// compacted.
pub async fn compact_if_needed(store: &LocalStore, threshold: u64) -> StoreResult<bool> {
    let appended = store.appends_since_compact().await;
    if appended <= threshold {
        return Ok(false);
    }
    info!("compacting WAL after {appended} appends (threshold {threshold})");
    store.compact().await?;
    Ok(true)
}
