use crate::aggregate::aggregate;
use crate::args::IngestArgs;
use crate::commands::{require, Out};
use crate::parse::parse_file;
use crate::store::SnapshotStore;
use crate::trend::{compare_snapshots, SnapshotComparison};
use crate::{Config, Result};
use serde::Serialize;
use tracing::{debug, warn};

/// What `inflow ingest` reports about the snapshot it stored.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub id: String,
    pub filename: String,
    pub total: u64,
    pub top_group: String,
    /// The change against the snapshot that was the latest before this one, if there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<SnapshotComparison>,
}

/// Parses the file named in `args`, aggregates it with the configured options and stores the
/// result as a new snapshot.
///
/// A file with no data rows is stored as an empty snapshot.
pub async fn ingest(config: Config, args: IngestArgs) -> Result<Out<IngestReport>> {
    let path = args.file();
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let records = parse_file(path).await?;
    let snapshot = aggregate(&records, &config.aggregate_options());
    if snapshot.total == 0 {
        warn!(
            "No records in '{filename}' matched type '{}', storing an empty snapshot",
            config.type_keyword()
        );
    }

    let db = config.db();
    let previous = db.list_metadata().await?.into_iter().next();
    let id = db.save(&snapshot, &filename).await?;
    debug!("Stored '{filename}' as snapshot {id}");

    let comparison = match previous {
        Some(prior) => {
            let current = require(db, &id).await?;
            let prior = require(db, &prior.id).await?;
            Some(compare_snapshots(&current, &prior).limited(config.top_movers()))
        }
        None => None,
    };

    let message = match &comparison {
        Some(c) => format!(
            "Ingested {} records from '{filename}' as snapshot {id} ({:+} vs previous)",
            snapshot.total, c.total.delta
        ),
        None => format!(
            "Ingested {} records from '{filename}' as snapshot {id}",
            snapshot.total
        ),
    };

    Ok(Out::new(
        message,
        IngestReport {
            id,
            filename,
            total: snapshot.total,
            top_group: snapshot.top_group,
            comparison,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{TestEnv, SAMPLE_CSV};

    #[tokio::test]
    async fn test_ingest_first_file() {
        let env = TestEnv::new().await;
        let path = env.write_file(SAMPLE_CSV);
        let out = ingest(env.config(), IngestArgs::new(&path)).await.unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.top_group, "Acme");
        assert!(report.comparison.is_none());
        assert!(report.filename.ends_with(".csv"));

        let stored = require(env.config().db(), &report.id).await.unwrap();
        assert_eq!(stored.total, 3);
        assert_eq!(stored.metrics.pending_etr, 1);
    }

    #[tokio::test]
    async fn test_ingest_compares_with_previous() {
        let env = TestEnv::new().await;
        env.ingest_text(SAMPLE_CSV).await;

        let bigger = format!(
            "{SAMPLE_CSV}Ed,555-0105,Springfield,Zenith,2026-01-06,Hero,Glamour,Mobile Device,\n"
        );
        let path = env.write_file(&bigger);
        let out = ingest(env.config(), IngestArgs::new(&path)).await.unwrap();
        let comparison = out.structure().unwrap().comparison.clone().unwrap();
        assert_eq!(comparison.total.delta, 1);
        assert_eq!(comparison.top_shifter.unwrap().name, "Zenith");
        assert!(out.message().contains("(+1 vs previous)"));
    }

    #[tokio::test]
    async fn test_ingest_header_only_stores_empty_snapshot() {
        let env = TestEnv::new().await;
        let id = env.ingest_text("Client,Dealership,Type\n").await;
        let stored = require(env.config().db(), &id).await.unwrap();
        assert_eq!(stored.total, 0);
        assert_eq!(stored.top_group, "N/A");
    }

    #[tokio::test]
    async fn test_ingest_missing_file() {
        let env = TestEnv::new().await;
        let result = ingest(env.config(), IngestArgs::new("/no/such/file.csv")).await;
        assert!(result.is_err());
    }
}
