use crate::args::{DigestArgs, ExploreArgs, OutputFormat};
use crate::commands::{snapshot_or_latest, Out};
use crate::digest::digest_with;
use crate::explore::{explore as explore_records, to_csv_string, ExploreQuery, Page};
use crate::model::SaleRecord;
use crate::{Config, Result};
use chrono::Utc;
use serde::Serialize;

/// What `inflow explore` prints.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ExploreOutput {
    Page(Page<SaleRecord>),
    /// Every matching record, in the requested order.
    Csv { rows: usize },
}

/// Searches, sorts and pages through the records of one snapshot.
///
/// With `--format csv` every matching record is exported rather than a single page.
pub async fn explore(config: Config, args: ExploreArgs) -> Result<Out<ExploreOutput>> {
    let snapshot = snapshot_or_latest(config.db(), args.id()).await?;
    let mut query = ExploreQuery {
        search: args.search().to_string(),
        sort: args.sort(),
        page: args.page(),
        ..ExploreQuery::default()
    };

    match args.format() {
        OutputFormat::Json => {
            let page = explore_records(&snapshot.records, &query);
            let message = format!(
                "Page {} of {} ({} matching records)",
                page.page, page.total_pages, page.total_matches
            );
            Ok(Out::new(message, ExploreOutput::Page(page)))
        }
        OutputFormat::Csv => {
            query.page = 1;
            query.page_size = snapshot.records.len().max(1);
            let page = explore_records(&snapshot.records, &query);
            let csv = to_csv_string(&page.items)?;
            let rows = page.items.len();
            Ok(Out::new(
                format!("Exported {rows} matching records"),
                ExploreOutput::Csv { rows },
            )
            .with_text(csv))
        }
    }
}

/// Renders the text digest of one snapshot, dated by when the snapshot was stored.
///
/// The `--no-*` flags leave sections out.
pub async fn digest(config: Config, args: DigestArgs) -> Result<Out<()>> {
    let snapshot = snapshot_or_latest(config.db(), args.id()).await?;
    let date = snapshot.timestamp().unwrap_or_else(Utc::now).date_naive();
    let text = digest_with(&snapshot, date, args.sections());
    Ok(Out::new_message(format!(
        "Digest for snapshot {}",
        snapshot.id().unwrap_or_default()
    ))
    .with_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::DigestSections;
    use crate::explore::SortDirection;
    use crate::model::RecordField;
    use crate::test::{TestEnv, SAMPLE_CSV};

    #[tokio::test]
    async fn test_explore_page() {
        let env = TestEnv::new().await;
        let id = env.ingest_text(SAMPLE_CSV).await;

        let args = ExploreArgs::new(Some(id), "springfield")
            .with_sort(RecordField::Client, SortDirection::Desc);
        let out = explore(env.config(), args).await.unwrap();
        let ExploreOutput::Page(page) = out.structure().unwrap() else {
            panic!("expected a page");
        };
        assert_eq!(page.total_matches, 2);
        assert_eq!(page.items[0].client(), "Bob");
        assert_eq!(page.items[1].client(), "Ada");
    }

    #[tokio::test]
    async fn test_explore_csv_exports_all_matches() {
        let env = TestEnv::new().await;
        env.ingest_text(SAMPLE_CSV).await;

        let args = ExploreArgs::new(None, "")
            .with_format(OutputFormat::Csv)
            .with_page(7);
        let out = explore(env.config(), args).await.unwrap();
        let csv = out.text().unwrap();
        assert_eq!(csv.lines().count(), 4);
        assert!(csv.contains("\"Acme, North Branch\""));
        assert!(out.message().contains("Exported 3"));
    }

    #[tokio::test]
    async fn test_digest() {
        let env = TestEnv::new().await;
        env.ingest_text(SAMPLE_CSV).await;

        let out = digest(env.config(), DigestArgs::default()).await.unwrap();
        let text = out.text().unwrap();
        assert!(text.starts_with("*EXECUTIVE AUDIT* | "));
        assert!(text.contains("*Global Volume:* 3 Units"));
        assert!(text.contains(" 1. Acme (2)"));
        assert!(text.contains(" 2. Zenith (1)"));
    }

    #[tokio::test]
    async fn test_digest_sections_can_be_left_out() {
        let env = TestEnv::new().await;
        let id = env.ingest_text(SAMPLE_CSV).await;

        let sections = DigestSections {
            header: false,
            ranking: false,
            ..DigestSections::default()
        };
        let out = digest(env.config(), DigestArgs::with_sections(Some(id), sections))
            .await
            .unwrap();
        let text = out.text().unwrap();
        assert!(text.starts_with("*Global Volume:* 3 Units"));
        assert!(!text.contains("EXECUTIVE AUDIT"));
        assert!(!text.contains("Acme (2)"));
    }
}
