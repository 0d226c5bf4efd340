//! A short plain-text summary of a snapshot, formatted for pasting into a chat channel.

use crate::model::StatsSnapshot;
use chrono::NaiveDate;
use std::fmt::Write;

/// How many groups the ranking section lists.
pub const RANKING_SIZE: usize = 10;

/// Which sections `digest` renders.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DigestSections {
    pub header: bool,
    pub volume: bool,
    pub metrics: bool,
    pub ranking: bool,
}

impl Default for DigestSections {
    fn default() -> Self {
        Self {
            header: true,
            volume: true,
            metrics: true,
            ranking: true,
        }
    }
}

/// Renders every section of the digest for `snapshot`.
pub fn digest(snapshot: &StatsSnapshot, date: NaiveDate) -> String {
    digest_with(snapshot, date, DigestSections::default())
}

/// Renders the selected sections, separated by blank lines.
pub fn digest_with(snapshot: &StatsSnapshot, date: NaiveDate, sections: DigestSections) -> String {
    let mut blocks: Vec<String> = Vec::new();

    if sections.header {
        blocks.push(format!("*EXECUTIVE AUDIT* | {}", date.format("%Y-%m-%d")));
    }

    if sections.volume {
        blocks.push(format!("*Global Volume:* {} Units", thousands(snapshot.total)));
    }

    if sections.metrics {
        blocks.push(format!(
            "*ETR Pending:* {}\n*SW Validation:* {}",
            thousands(snapshot.metrics.pending_etr),
            thousands(snapshot.metrics.pending_software)
        ));
    }

    if sections.ranking {
        let mut ranking = format!("*Top {RANKING_SIZE} Performers:*");
        for (ix, entry) in snapshot.by_group.iter().take(RANKING_SIZE).enumerate() {
            // writing to a String cannot fail
            let _ = write!(
                ranking,
                "\n{:>2}. {} ({})",
                ix + 1,
                entry.name,
                thousands(entry.count)
            );
        }
        blocks.push(ranking);
    }

    blocks.join("\n\n")
}

fn thousands(n: u64) -> String {
    format_num::format_num!(",.0f", n as f64)
}
