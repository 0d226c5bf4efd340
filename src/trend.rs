//! Period-over-period comparison of aggregated snapshots.
//!
//! Two rankings live here and consumers rely on each of them:
//! - `top_movers` ranks by the absolute size of the change, up or down.
//! - `top_shifter` picks the single biggest gain by signed delta.

use crate::model::{AggregatedEntry, StatsSnapshot};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How many movers display-oriented callers show by default.
pub const DEFAULT_TOP_MOVERS: usize = 10;

/// The percentage reported when something appears from nothing.
const NEW_ENTITY_PERCENT: i64 = 100;

/// The change between two counts.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct Delta {
    pub current: u64,
    pub prior: u64,
    pub delta: i64,
    /// Whole-number percent change relative to `prior`.
    pub percent: i64,
    pub is_up: bool,
}

impl Delta {
    pub fn between(current: u64, prior: u64) -> Self {
        let delta = current as i64 - prior as i64;
        let percent = if prior != 0 {
            (delta as f64 / prior as f64 * 100.0).round() as i64
        } else if delta != 0 {
            NEW_ENTITY_PERCENT
        } else {
            0
        };
        Self {
            current,
            prior,
            delta,
            percent,
            is_up: delta >= 0,
        }
    }
}

/// The change for one named entity of a dimension.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct EntityDelta {
    pub name: String,
    #[serde(flatten)]
    pub change: Delta,
}

impl EntityDelta {
    pub fn delta(&self) -> i64 {
        self.change.delta
    }
}

/// Compares every entity of `current` and `prior`, largest absolute change first.
///
/// Entities missing from either side count as zero there. Ties keep union order: names from
/// `current` first, then names seen only in `prior`.
pub fn compare_entries(
    current: &[AggregatedEntry],
    prior: &[AggregatedEntry],
) -> Vec<EntityDelta> {
    let mut deltas = union_deltas(current, prior);
    deltas.sort_by_key(|d| std::cmp::Reverse(d.change.delta.unsigned_abs()));
    deltas
}

/// The `n` largest movers in either direction.
pub fn top_movers(
    current: &[AggregatedEntry],
    prior: &[AggregatedEntry],
    n: usize,
) -> Vec<EntityDelta> {
    let mut deltas = compare_entries(current, prior);
    deltas.truncate(n);
    deltas
}

/// The entity with the largest positive delta, or `None` if nothing grew. The first entity in
/// union order wins a tie.
pub fn top_shifter(
    current: &[AggregatedEntry],
    prior: &[AggregatedEntry],
) -> Option<EntityDelta> {
    union_deltas(current, prior)
        .into_iter()
        .filter(|d| d.change.delta > 0)
        .fold(None, |best: Option<EntityDelta>, d| match best {
            Some(b) if b.change.delta >= d.change.delta => Some(b),
            _ => Some(d),
        })
}

/// The change in total volume between two snapshots.
pub fn volume_delta(current_total: u64, prior_total: u64) -> Delta {
    Delta::between(current_total, prior_total)
}

fn union_deltas(current: &[AggregatedEntry], prior: &[AggregatedEntry]) -> Vec<EntityDelta> {
    let prior_counts: HashMap<&str, u64> =
        prior.iter().map(|e| (e.name.as_str(), e.count)).collect();
    let current_counts: HashMap<&str, u64> =
        current.iter().map(|e| (e.name.as_str(), e.count)).collect();

    let mut seen: HashSet<&str> = HashSet::new();
    current
        .iter()
        .chain(prior.iter())
        .filter(|e| seen.insert(e.name.as_str()))
        .map(|e| {
            let name = e.name.as_str();
            EntityDelta {
                name: name.to_string(),
                change: Delta::between(
                    current_counts.get(name).copied().unwrap_or_default(),
                    prior_counts.get(name).copied().unwrap_or_default(),
                ),
            }
        })
        .collect()
}

/// A whole-snapshot comparison.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct SnapshotComparison {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_id: Option<String>,
    pub total: Delta,
    pub groups: Vec<EntityDelta>,
    pub outlets: Vec<EntityDelta>,
    pub models: Vec<EntityDelta>,
    pub branches: Vec<EntityDelta>,
    /// The group with the biggest gain.
    pub top_shifter: Option<EntityDelta>,
}

impl SnapshotComparison {
    /// Keeps only the first `n` movers of every dimension.
    pub fn limited(mut self, n: usize) -> Self {
        self.groups.truncate(n);
        self.outlets.truncate(n);
        self.models.truncate(n);
        self.branches.truncate(n);
        self
    }
}

/// Compares `current` against `prior` on every dimension.
pub fn compare_snapshots(current: &StatsSnapshot, prior: &StatsSnapshot) -> SnapshotComparison {
    SnapshotComparison {
        current_id: current.id.clone(),
        prior_id: prior.id.clone(),
        total: volume_delta(current.total, prior.total),
        groups: compare_entries(&current.by_group, &prior.by_group),
        outlets: compare_entries(&current.by_outlet, &prior.by_outlet),
        models: compare_entries(&current.by_model, &prior.by_model),
        branches: compare_entries(&current.by_branch, &prior.by_branch),
        top_shifter: top_shifter(&current.by_group, &prior.by_group),
    }
}

/// One snapshot's total volume on a timeline.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct TimelinePoint {
    /// `T-0` is the newest snapshot, `T-1` the one before it, and so on.
    pub label: String,
    pub id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub total: u64,
}

/// Totals of `history` (newest first) laid out oldest first.
pub fn timeline(history: &[StatsSnapshot]) -> Vec<TimelinePoint> {
    history
        .iter()
        .enumerate()
        .rev()
        .map(|(age, s)| TimelinePoint {
            label: format!("T-{age}"),
            id: s.id.clone(),
            timestamp: s.timestamp,
            total: s.total,
        })
        .collect()
}
