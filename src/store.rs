//! The persistence contract for snapshots.
//!
//! A store keeps two logical tables: a metadata index for listing and the full payloads. Both
//! are written and deleted together.

use crate::model::{SnapshotMetadata, StatsSnapshot};
use crate::Result;
use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::warn;

/// Durable, keyed storage for `StatsSnapshot`s.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Saves `snapshot` under a freshly generated id and returns that id. Metadata and payload
    /// are written in one transaction.
    async fn save(&self, snapshot: &StatsSnapshot, filename: &str) -> Result<String>;

    /// All metadata entries, newest first.
    async fn list_metadata(&self) -> Result<Vec<SnapshotMetadata>>;

    /// The stored payload for `id`, or `None` if there is no such snapshot.
    async fn load_payload(&self, id: &str) -> Result<Option<StatsSnapshot>>;

    /// Removes the metadata and payload for `id`. Deleting an unknown id is not an error.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Loads the payloads for `ids` concurrently and returns them in the order of `ids`.
///
/// Every lookup finishes before this returns. Lookups that fail or find nothing are logged and
/// left out of the result.
pub async fn load_history<S>(store: &S, ids: &[String]) -> Vec<StatsSnapshot>
where
    S: SnapshotStore + Clone + 'static,
{
    let mut set = JoinSet::new();
    for (ix, id) in ids.iter().enumerate() {
        let store = store.clone();
        let id = id.clone();
        set.spawn(async move {
            let result = store.load_payload(&id).await;
            (ix, id, result)
        });
    }

    let mut found: Vec<(usize, StatsSnapshot)> = Vec::with_capacity(ids.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((ix, _, Ok(Some(snapshot)))) => found.push((ix, snapshot)),
            Ok((_, id, Ok(None))) => warn!("Snapshot {id} is listed but has no payload"),
            Ok((_, id, Err(e))) => warn!("Unable to load snapshot {id}: {e:#}"),
            Err(e) => warn!("A history lookup did not complete: {e}"),
        }
    }
    found.sort_by_key(|(ix, _)| *ix);
    found.into_iter().map(|(_, snapshot)| snapshot).collect()
}

/// Loads up to `window` of the most recent snapshots, newest first.
pub async fn load_recent<S>(store: &S, window: usize) -> Result<Vec<StatsSnapshot>>
where
    S: SnapshotStore + Clone + 'static,
{
    let ids: Vec<String> = store
        .list_metadata()
        .await?
        .into_iter()
        .take(window)
        .map(|m| m.id)
        .collect();
    Ok(load_history(store, &ids).await)
}
