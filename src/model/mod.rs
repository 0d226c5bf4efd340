//! Types that represent the core data model, such as `SaleRecord` and `StatsSnapshot`.
mod record;
mod stats;

pub use record::{RecordField, SaleRecord};
pub use stats::{
    AggregatedEntry, OutletFallback, RelationalMap, SnapshotMetadata, StatsSnapshot,
    StatusMetrics, BASELINE_HEALTH_SCORE, NOT_AVAILABLE,
};
