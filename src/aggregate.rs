//! Rolls filtered `SaleRecord`s up into a `StatsSnapshot`.

use crate::model::{
    AggregatedEntry, OutletFallback, RelationalMap, SaleRecord, StatsSnapshot, StatusMetrics,
    BASELINE_HEALTH_SCORE, NOT_AVAILABLE,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// The type keyword used when none is configured.
pub const DEFAULT_TYPE_KEYWORD: &str = "mobile device";

const UNKNOWN: &str = "Unknown";

/// Keywords for each status counter. A counter matches when any of its keywords is found.
const STATUS_KEYWORDS: &[(StatusCounter, &[&str])] = &[
    (StatusCounter::PendingEtr, &["etr", "technical review"]),
    (StatusCounter::PendingSoftware, &["software", "validation"]),
    (StatusCounter::PaymentStage, &["payment"]),
    (StatusCounter::ReprocessStage, &["reprocess", "agreement"]),
];

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum StatusCounter {
    PendingEtr,
    PendingSoftware,
    PaymentStage,
    ReprocessStage,
}

/// Settings that shape aggregation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AggregateOptions {
    /// Only records whose type contains this keyword (case-insensitive) are counted.
    pub type_keyword: String,
    pub outlet_fallback: OutletFallback,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            type_keyword: DEFAULT_TYPE_KEYWORD.to_string(),
            outlet_fallback: OutletFallback::default(),
        }
    }
}

/// An entry annotated with its share of the total, as a whole percentage.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct ShareEntry {
    pub name: String,
    pub count: u64,
    pub share: u64,
}

/// Counts occurrences of names, remembering the order in which names were first seen.
#[derive(Debug, Default, Clone)]
struct Tally {
    entries: Vec<AggregatedEntry>,
    index: HashMap<String, usize>,
}

impl Tally {
    fn bump(&mut self, name: &str) {
        match self.index.get(name) {
            Some(&ix) => self.entries[ix].count += 1,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push(AggregatedEntry::new(name, 1));
            }
        }
    }

    fn into_sorted(self) -> Vec<AggregatedEntry> {
        let mut entries = self.entries;
        sort_entries(&mut entries);
        entries
    }
}

/// Sorts by descending count. The sort is stable, so ties keep their current order.
pub fn sort_entries(entries: &mut [AggregatedEntry]) {
    entries.sort_by(|a, b| b.count.cmp(&a.count));
}

/// Splits a raw dealership string into its (group, outlet) pair.
///
/// The group is everything before the first comma and the outlet everything after it. Without a
/// comma, or with nothing after it, the outlet comes from `fallback`.
pub fn split_dealership(raw: &str, fallback: OutletFallback) -> (String, String) {
    let whole = non_blank_or_unknown(raw);
    match whole.split_once(',') {
        Some((group, outlet)) => {
            let group = non_blank_or_unknown(group);
            let outlet = outlet.trim();
            let outlet = if outlet.is_empty() {
                fallback.outlet_for(group)
            } else {
                outlet
            };
            (group.to_string(), outlet.to_string())
        }
        None => (whole.to_string(), fallback.outlet_for(whole).to_string()),
    }
}

/// Returns true when `record` passes the type filter for `keyword`.
pub fn matches_type(record: &SaleRecord, keyword: &str) -> bool {
    record
        .record_type()
        .to_lowercase()
        .contains(&keyword.to_lowercase())
}

/// Filters `records` by type and aggregates the survivors.
pub fn aggregate(records: &[SaleRecord], options: &AggregateOptions) -> StatsSnapshot {
    let keyword = options.type_keyword.to_lowercase();
    let filtered: Vec<SaleRecord> = records
        .iter()
        .filter(|r| matches_type(r, &keyword))
        .cloned()
        .collect();
    debug!(
        "{} of {} records matched type keyword '{}'",
        filtered.len(),
        records.len(),
        options.type_keyword
    );

    let mut groups = Tally::default();
    let mut outlets = Tally::default();
    let mut models = Tally::default();
    let mut branches = Tally::default();
    let mut relational: HashMap<String, Tally> = HashMap::new();
    let mut metrics = StatusMetrics::default();

    for record in &filtered {
        let (group, outlet) = split_dealership(record.dealership(), options.outlet_fallback);
        groups.bump(&group);
        outlets.bump(&outlet);
        models.bump(non_blank_or_unknown(record.model()));
        branches.bump(non_blank_or_unknown(record.branch_office()));
        relational.entry(group).or_default().bump(&outlet);
        if let Some(status) = record.status() {
            count_status(&mut metrics, status);
        }
    }

    let group_outlets: RelationalMap = relational
        .into_iter()
        .map(|(group, tally)| (group, tally.into_sorted()))
        .collect();

    let by_group = groups.into_sorted();
    let by_outlet = outlets.into_sorted();
    let by_model = models.into_sorted();
    let by_branch = branches.into_sorted();

    StatsSnapshot {
        id: None,
        timestamp: None,
        top_group: top_name(&by_group),
        top_outlet: top_name(&by_outlet),
        top_model: top_name(&by_model),
        top_branch: top_name(&by_branch),
        by_group,
        by_outlet,
        by_model,
        by_branch,
        group_outlets,
        metrics,
        total: filtered.len() as u64,
        records: filtered,
        health_score: BASELINE_HEALTH_SCORE,
    }
}

/// The first `limit` entries with their whole-percent share of `total`.
pub fn market_share(entries: &[AggregatedEntry], total: u64, limit: usize) -> Vec<ShareEntry> {
    entries
        .iter()
        .take(limit)
        .map(|e| ShareEntry {
            name: e.name.clone(),
            count: e.count,
            share: if total == 0 {
                0
            } else {
                (e.count as f64 / total as f64 * 100.0).round() as u64
            },
        })
        .collect()
}

fn count_status(metrics: &mut StatusMetrics, status: &str) {
    let status = status.to_lowercase();
    for (counter, keywords) in STATUS_KEYWORDS {
        if !keywords.iter().any(|k| status.contains(k)) {
            continue;
        }
        match counter {
            StatusCounter::PendingEtr => metrics.pending_etr += 1,
            StatusCounter::PendingSoftware => metrics.pending_software += 1,
            StatusCounter::PaymentStage => metrics.payment_stage += 1,
            StatusCounter::ReprocessStage => metrics.reprocess_stage += 1,
        }
    }
}

fn top_name(entries: &[AggregatedEntry]) -> String {
    entries
        .first()
        .map(|e| e.name.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn non_blank_or_unknown(s: &str) -> &str {
    let s = s.trim();
    if s.is_empty() {
        UNKNOWN
    } else {
        s
    }
}
