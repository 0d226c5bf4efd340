//! Commands that list, show and remove stored snapshots.

use crate::aggregate::{market_share, ShareEntry};
use crate::args::{DeleteArgs, Dimension, SharesArgs, ShowArgs};
use crate::commands::{snapshot_or_latest, Out};
use crate::model::{SnapshotMetadata, StatsSnapshot};
use crate::store::SnapshotStore;
use crate::{Config, Result};

/// Lists snapshot metadata, newest first.
pub async fn list(config: Config) -> Result<Out<Vec<SnapshotMetadata>>> {
    let metadata = config.db().list_metadata().await?;
    let message = match metadata.len() {
        0 => "No snapshots stored".to_string(),
        1 => "1 snapshot stored".to_string(),
        n => format!("{n} snapshots stored"),
    };
    Ok(Out::new(message, metadata))
}

/// Shows the snapshot named in `args`, or the latest one.
pub async fn show(config: Config, args: ShowArgs) -> Result<Out<StatsSnapshot>> {
    let snapshot = snapshot_or_latest(config.db(), args.id()).await?;
    let message = format!(
        "Snapshot {} holds {} records, top group {}",
        snapshot.id().unwrap_or_default(),
        snapshot.total,
        snapshot.top_group
    );
    Ok(Out::new(message, snapshot))
}

/// Each entity's share of the snapshot total for the dimension named in `args`.
pub async fn shares(config: Config, args: SharesArgs) -> Result<Out<Vec<ShareEntry>>> {
    let snapshot = snapshot_or_latest(config.db(), args.id()).await?;
    let entries = match args.dimension() {
        Dimension::Group => &snapshot.by_group,
        Dimension::Outlet => &snapshot.by_outlet,
        Dimension::Model => &snapshot.by_model,
        Dimension::Branch => &snapshot.by_branch,
    };
    let shares = market_share(entries, snapshot.total, args.limit());
    let message = format!(
        "Share of {} records by {} in snapshot {}",
        snapshot.total,
        args.dimension(),
        snapshot.id().unwrap_or_default()
    );
    Ok(Out::new(message, shares))
}

/// Deletes a snapshot. Deleting an id that does not exist succeeds.
pub async fn delete(config: Config, args: DeleteArgs) -> Result<Out<()>> {
    config.db().delete(args.id()).await?;
    Ok(format!("Deleted snapshot {}", args.id()).into())
}

/// The JSON Schema of `StatsSnapshot`, the shape every stored payload follows.
pub fn schema() -> Result<Out<serde_json::Value>> {
    let schema = schemars::schema_for!(StatsSnapshot);
    let value = serde_json::to_value(&schema)?;
    Ok(Out::new("JSON Schema for a stored snapshot", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{TestEnv, SAMPLE_CSV};

    #[tokio::test]
    async fn test_list_show_delete() {
        let env = TestEnv::new().await;
        let first = env.ingest_text(SAMPLE_CSV).await;
        let second = env.ingest_text("Client,Type\nAda,Mobile Device\n").await;

        let listed = list(env.config()).await.unwrap();
        assert_eq!(listed.message(), "2 snapshots stored");
        let ids: Vec<&str> = listed
            .structure()
            .unwrap()
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec![second.as_str(), first.as_str()]);

        let latest = show(env.config(), ShowArgs::default()).await.unwrap();
        assert_eq!(latest.structure().unwrap().id(), Some(second.as_str()));
        let named = show(env.config(), ShowArgs::new(Some(first.clone())))
            .await
            .unwrap();
        assert_eq!(named.structure().unwrap().total, 3);

        delete(env.config(), DeleteArgs::new(&second)).await.unwrap();
        delete(env.config(), DeleteArgs::new(&second)).await.unwrap();
        let latest = show(env.config(), ShowArgs::default()).await.unwrap();
        assert_eq!(latest.structure().unwrap().id(), Some(first.as_str()));
    }

    #[tokio::test]
    async fn test_show_errors() {
        let env = TestEnv::new().await;
        let err = show(env.config(), ShowArgs::default()).await.unwrap_err();
        assert!(err.to_string().contains("No snapshots"));
        let err = show(env.config(), ShowArgs::new(Some("nope".to_string())))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no snapshot with id 'nope'"));
    }

    #[tokio::test]
    async fn test_shares_by_group() {
        let env = TestEnv::new().await;
        env.ingest_text(SAMPLE_CSV).await;

        let out = shares(env.config(), SharesArgs::default()).await.unwrap();
        assert!(out.message().contains("by group"));
        let entries = out.structure().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Acme");
        assert_eq!(entries[0].count, 2);
        assert_eq!(entries[0].share, 67);
        assert_eq!(entries[1].name, "Zenith");
        assert_eq!(entries[1].share, 33);
    }

    #[tokio::test]
    async fn test_shares_dimension_and_limit() {
        let env = TestEnv::new().await;
        env.ingest_text(SAMPLE_CSV).await;

        let args = SharesArgs::new(None, Dimension::Branch, 1);
        let out = shares(env.config(), args).await.unwrap();
        let entries = out.structure().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Springfield");
        assert_eq!(entries[0].share, 67);

        let err = shares(
            env.config(),
            SharesArgs::new(Some("nope".to_string()), Dimension::Model, 5),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("no snapshot with id 'nope'"));
    }

    #[test]
    fn test_schema_names_snapshot_fields() {
        let out = schema().unwrap();
        let json = out.structure().unwrap().to_string();
        assert!(json.contains("by_group"));
        assert!(json.contains("group_outlets"));
        assert!(json.contains("health_score"));
    }
}
