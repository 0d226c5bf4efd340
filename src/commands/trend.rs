//! Commands that look at more than one snapshot.

use crate::args::{CompareArgs, TimelineArgs};
use crate::commands::{require, Out};
use crate::store::{load_history, load_recent, SnapshotStore};
use crate::trend::{
    compare_snapshots, timeline as build_timeline, SnapshotComparison, TimelinePoint,
};
use crate::{Config, Result};
use anyhow::{bail, Context};

/// Compares two snapshots. Without ids this is the latest against the one stored before it. With
/// only `--current`, the prior is the snapshot stored just before the current one.
pub async fn compare(config: Config, args: CompareArgs) -> Result<Out<SnapshotComparison>> {
    let db = config.db();
    let metadata = db.list_metadata().await?;

    let current_id = match args.current() {
        Some(id) => id.to_string(),
        None => match metadata.first() {
            Some(latest) => latest.id.clone(),
            None => bail!("No snapshots have been ingested yet"),
        },
    };

    if !metadata.iter().any(|m| m.id == current_id) {
        bail!("There is no snapshot with id '{current_id}'");
    }

    let prior_id = match args.prior() {
        Some(id) => id.to_string(),
        None => metadata
            .iter()
            .skip_while(|m| m.id != current_id)
            .nth(1)
            .map(|m| m.id.clone())
            .with_context(|| {
                format!("There is no snapshot before {current_id} to compare against")
            })?,
    };

    let ids = [current_id.clone(), prior_id.clone()];
    let mut loaded = load_history(db, &ids).await.into_iter();
    let (current, prior) = match (loaded.next(), loaded.next()) {
        (Some(current), Some(prior)) => (current, prior),
        // report which id is missing
        _ => (require(db, &current_id).await?, require(db, &prior_id).await?),
    };

    let top = args.top().unwrap_or_else(|| config.top_movers());
    let comparison = compare_snapshots(&current, &prior).limited(top);
    let message = format!(
        "Snapshot {current_id} vs {prior_id}: {} -> {} records ({:+}, {:+}%)",
        comparison.total.prior,
        comparison.total.current,
        comparison.total.delta,
        comparison.total.percent
    );
    Ok(Out::new(message, comparison))
}

/// Total volume over the most recent snapshots, oldest first.
pub async fn timeline(config: Config, args: TimelineArgs) -> Result<Out<Vec<TimelinePoint>>> {
    let window = args.window().unwrap_or_else(|| config.history_window());
    let history = load_recent(config.db(), window).await?;
    let points = build_timeline(&history);
    let message = format!("Timeline of the last {} snapshots", points.len());
    Ok(Out::new(message, points))
}
