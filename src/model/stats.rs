use crate::model::SaleRecord;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder used for every top-* field when a dimension has no entries.
pub const NOT_AVAILABLE: &str = "N/A";

/// Placeholder health score. There is no formula behind it.
pub const BASELINE_HEALTH_SCORE: u32 = 100;

/// A name and the number of records counted against it.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct AggregatedEntry {
    pub name: String,
    pub count: u64,
}

impl AggregatedEntry {
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Group name to the outlets counted under it, each list sorted by descending count.
pub type RelationalMap = BTreeMap<String, Vec<AggregatedEntry>>;

/// Counters driven by keyword matches against the free-text status column.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct StatusMetrics {
    /// Waiting on a technical review (ETR).
    pub pending_etr: u64,
    /// Waiting on software validation.
    pub pending_software: u64,
    pub payment_stage: u64,
    /// Being reprocessed or waiting on an agreement.
    pub reprocess_stage: u64,
}

/// What to use as the outlet when the dealership string has no comma.
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
#[value(rename_all = "snake_case")]
pub enum OutletFallback {
    /// Use the literal `"Main Office"`.
    #[default]
    MainOffice,
    /// Repeat the whole dealership string as the outlet.
    WholeName,
}

serde_plain::derive_display_from_serialize!(OutletFallback);
serde_plain::derive_fromstr_from_deserialize!(OutletFallback);

impl OutletFallback {
    pub const MAIN_OFFICE: &'static str = "Main Office";

    pub(crate) fn outlet_for<'a>(&self, whole: &'a str) -> &'a str {
        match self {
            OutletFallback::MainOffice => Self::MAIN_OFFICE,
            OutletFallback::WholeName => whole,
        }
    }
}

/// The result of aggregating one upload.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct StatsSnapshot {
    /// Assigned by the store when the snapshot is saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Assigned by the store when the snapshot is saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub by_group: Vec<AggregatedEntry>,
    pub by_outlet: Vec<AggregatedEntry>,
    pub by_model: Vec<AggregatedEntry>,
    pub by_branch: Vec<AggregatedEntry>,
    pub group_outlets: RelationalMap,
    pub metrics: StatusMetrics,
    pub total: u64,
    pub top_group: String,
    pub top_outlet: String,
    pub top_model: String,
    pub top_branch: String,
    /// The records that passed the type filter, in file order.
    pub records: Vec<SaleRecord>,
    pub health_score: u32,
}

impl Default for StatsSnapshot {
    fn default() -> Self {
        Self {
            id: None,
            timestamp: None,
            by_group: Vec::new(),
            by_outlet: Vec::new(),
            by_model: Vec::new(),
            by_branch: Vec::new(),
            group_outlets: RelationalMap::new(),
            metrics: StatusMetrics::default(),
            total: 0,
            top_group: NOT_AVAILABLE.to_string(),
            top_outlet: NOT_AVAILABLE.to_string(),
            top_model: NOT_AVAILABLE.to_string(),
            top_branch: NOT_AVAILABLE.to_string(),
            records: Vec::new(),
            health_score: BASELINE_HEALTH_SCORE,
        }
    }
}

impl StatsSnapshot {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Returns a copy with the store-assigned fields attached.
    pub(crate) fn with_identity(&self, id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Some(id.into()),
            timestamp: Some(timestamp),
            ..self.clone()
        }
    }
}

/// The lightweight index entry kept for every stored snapshot.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct SnapshotMetadata {
    pub id: String,
    /// Name of the file the snapshot was ingested from.
    pub filename: String,
    pub timestamp: DateTime<Utc>,
    pub total: u64,
    pub top_group: String,
    pub health_score: u32,
}
