//! Search, sort and page through the records held in a snapshot.

use crate::model::{RecordField, SaleRecord};
use crate::Result;
use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Write;

pub const DEFAULT_PAGE_SIZE: usize = 15;

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    JsonSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

serde_plain::derive_display_from_serialize!(SortDirection);
serde_plain::derive_fromstr_from_deserialize!(SortDirection);

/// What to show from a list of records.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ExploreQuery {
    /// Case-insensitive text that must appear in at least one field. Empty matches everything.
    pub search: String,
    pub sort: Option<(RecordField, SortDirection)>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl Default for ExploreQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct Page<T> {
    pub page: usize,
    pub page_size: usize,
    pub total_matches: usize,
    pub total_pages: usize,
    pub items: Vec<T>,
}

/// Applies `query` to `records`.
pub fn explore(records: &[SaleRecord], query: &ExploreQuery) -> Page<SaleRecord> {
    let needle = query.search.trim().to_lowercase();
    let mut matches: Vec<&SaleRecord> = records
        .iter()
        .filter(|r| needle.is_empty() || matches_search(r, &needle))
        .collect();

    if let Some((field, direction)) = query.sort {
        matches.sort_by(|a, b| {
            let ordering = a.get(field).to_lowercase().cmp(&b.get(field).to_lowercase());
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    let page_size = query.page_size.max(1);
    let page = query.page.max(1);
    let total_matches = matches.len();
    let items = matches
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .cloned()
        .collect();

    Page {
        page,
        page_size,
        total_matches,
        total_pages: total_matches.div_ceil(page_size),
        items,
    }
}

fn matches_search(record: &SaleRecord, needle: &str) -> bool {
    RecordField::ALL
        .iter()
        .any(|field| record.get(*field).to_lowercase().contains(needle))
}

/// Writes `records` as CSV with a header row. Every row has every field, blank when unset.
pub fn write_csv<W: Write>(records: &[SaleRecord], writer: W) -> Result<()> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(RecordField::ALL.iter().map(|f| f.to_string()))
        .context("Unable to write the CSV header")?;
    for record in records {
        w.write_record(RecordField::ALL.iter().map(|f| record.get(*f)))
            .context("Unable to write a record as CSV")?;
    }
    w.flush().context("Unable to flush CSV output")?;
    Ok(())
}

/// Renders `records` as a CSV string.
pub fn to_csv_string(records: &[SaleRecord]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(records, &mut buf)?;
    String::from_utf8(buf).context("CSV output was not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(client: &str, dealership: &str, model: &str) -> SaleRecord {
        let mut r = SaleRecord::default();
        r.set(RecordField::Client, client.to_string());
        r.set(RecordField::Dealership, dealership.to_string());
        r.set(RecordField::Model, model.to_string());
        r
    }

    fn records() -> Vec<SaleRecord> {
        (1..=20)
            .map(|i| record(&format!("client {i:02}"), "Acme, North", "X1"))
            .chain([
                record("bravo", "Zenith", "Y9"),
                record("Alpha", "zenith, depot", "Y9"),
            ])
            .collect()
    }

    #[test]
    fn test_default_query_pages_everything() {
        let page = explore(&records(), &ExploreQuery::default());
        assert_eq!(page.total_matches, 22);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 15);

        let second = explore(
            &records(),
            &ExploreQuery {
                page: 2,
                ..ExploreQuery::default()
            },
        );
        assert_eq!(second.items.len(), 7);

        let beyond = explore(
            &records(),
            &ExploreQuery {
                page: 9,
                ..ExploreQuery::default()
            },
        );
        assert!(beyond.items.is_empty());
    }

    #[test]
    fn test_huge_page_number_is_empty() {
        let query = ExploreQuery {
            page: usize::MAX,
            ..ExploreQuery::default()
        };
        let page = explore(&records(), &query);
        assert!(page.items.is_empty());
        assert_eq!(page.page, usize::MAX);
        assert_eq!(page.total_matches, 22);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let query = ExploreQuery {
            search: "ZENITH".to_string(),
            ..ExploreQuery::default()
        };
        let page = explore(&records(), &query);
        assert_eq!(page.total_matches, 2);

        let query = ExploreQuery {
            search: "y9".to_string(),
            ..ExploreQuery::default()
        };
        assert_eq!(explore(&records(), &query).total_matches, 2);
    }

    #[test]
    fn test_sort_by_field() {
        let query = ExploreQuery {
            search: "zenith".to_string(),
            sort: Some((RecordField::Client, SortDirection::Asc)),
            ..ExploreQuery::default()
        };
        let page = explore(&records(), &query);
        let clients: Vec<&str> = page.items.iter().map(|r| r.client()).collect();
        assert_eq!(clients, vec!["Alpha", "bravo"]);

        let query = ExploreQuery {
            sort: Some((RecordField::Client, SortDirection::Desc)),
            ..query
        };
        let page = explore(&records(), &query);
        assert_eq!(page.items[0].client(), "bravo");
    }

    #[test]
    fn test_csv_export() {
        let csv = to_csv_string(&[record("Ada", "Acme, North", "X1")]).unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("client,mobile_no,branch_office,dealership"));
        assert!(header.contains(",type"));
        assert!(lines.next().unwrap().contains("\"Acme, North\""));
    }
}
