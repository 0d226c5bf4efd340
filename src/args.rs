//! These structs provide the CLI interface for the inflow CLI.

use crate::digest::DigestSections;
use crate::explore::SortDirection;
use crate::model::RecordField;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// inflow: ingest sales-event exports and track how they change over time.
///
/// Each ingested file is parsed, filtered to the configured record type, and rolled up by
/// dealer group, outlet, model and branch. The result is stored as a snapshot so that later
/// uploads can be compared against it.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory, the configuration file and the snapshot database.
    ///
    /// Run this once before anything else. The directory is taken from --inflow-home and
    /// defaults to $HOME/inflow.
    Init,
    /// Parse and aggregate a CSV export, then store it as a new snapshot.
    Ingest(IngestArgs),
    /// List stored snapshots, newest first.
    List,
    /// Show a stored snapshot. Defaults to the latest.
    Show(ShowArgs),
    /// Delete a stored snapshot.
    Delete(DeleteArgs),
    /// Compare two snapshots. Defaults to the latest against the one before it.
    Compare(CompareArgs),
    /// Show total volume across recent snapshots, oldest first.
    Timeline(TimelineArgs),
    /// Search, sort and page through the records of a snapshot.
    Explore(ExploreArgs),
    /// Show each entity's share of the total volume for one dimension of a snapshot.
    Shares(SharesArgs),
    /// Print a short text summary of a snapshot.
    Digest(DigestArgs),
    /// Print the JSON Schema of a stored snapshot.
    Schema,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where inflow data and configuration is held. Defaults to ~/inflow
    #[arg(long, env = "INFLOW_HOME", default_value_t = default_inflow_home())]
    inflow_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, inflow_home: PathBuf) -> Self {
        Self {
            log_level,
            inflow_home: inflow_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn inflow_home(&self) -> &DisplayPath {
        &self.inflow_home
    }
}

/// Args for the `inflow ingest` command.
#[derive(Debug, Parser, Clone)]
pub struct IngestArgs {
    /// The CSV (or semicolon-separated) export to ingest.
    file: PathBuf,
}

impl IngestArgs {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// Args for commands that act on one snapshot, defaulting to the latest.
#[derive(Debug, Default, Parser, Clone)]
pub struct ShowArgs {
    /// The snapshot id. Defaults to the most recent snapshot.
    id: Option<String>,
}

impl ShowArgs {
    pub fn new(id: Option<String>) -> Self {
        Self { id }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// The rollup dimension `inflow shares` reports on.
#[derive(
    Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    #[default]
    Group,
    Outlet,
    Model,
    Branch,
}

serde_plain::derive_display_from_serialize!(Dimension);
serde_plain::derive_fromstr_from_deserialize!(Dimension);

/// Args for the `inflow shares` command.
#[derive(Debug, Parser, Clone)]
pub struct SharesArgs {
    /// The snapshot id. Defaults to the most recent snapshot.
    id: Option<String>,

    /// Which rollup to report on.
    #[arg(long, default_value_t = Dimension::Group)]
    dimension: Dimension,

    /// How many entries to show.
    #[arg(long, default_value_t = DEFAULT_SHARE_LIMIT)]
    limit: usize,
}

/// How many entries `inflow shares` shows by default.
pub const DEFAULT_SHARE_LIMIT: usize = 30;

impl Default for SharesArgs {
    fn default() -> Self {
        Self {
            id: None,
            dimension: Dimension::Group,
            limit: DEFAULT_SHARE_LIMIT,
        }
    }
}

impl SharesArgs {
    pub fn new(id: Option<String>, dimension: Dimension, limit: usize) -> Self {
        Self {
            id,
            dimension,
            limit,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Args for the `inflow digest` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct DigestArgs {
    /// The snapshot id. Defaults to the most recent snapshot.
    id: Option<String>,

    /// Leave out the title line.
    #[arg(long)]
    no_header: bool,

    /// Leave out the total volume.
    #[arg(long)]
    no_volume: bool,

    /// Leave out the pending counters.
    #[arg(long)]
    no_metrics: bool,

    /// Leave out the top performers.
    #[arg(long)]
    no_ranking: bool,
}

impl DigestArgs {
    pub fn new(id: Option<String>) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Builds args that render only the sections switched on in `sections`.
    pub fn with_sections(id: Option<String>, sections: DigestSections) -> Self {
        Self {
            id,
            no_header: !sections.header,
            no_volume: !sections.volume,
            no_metrics: !sections.metrics,
            no_ranking: !sections.ranking,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn sections(&self) -> DigestSections {
        DigestSections {
            header: !self.no_header,
            volume: !self.no_volume,
            metrics: !self.no_metrics,
            ranking: !self.no_ranking,
        }
    }
}

/// Args for the `inflow delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The id of the snapshot to delete.
    id: String,
}

impl DeleteArgs {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Args for the `inflow compare` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct CompareArgs {
    /// The newer snapshot. Defaults to the latest.
    #[arg(long)]
    current: Option<String>,

    /// The older snapshot. Defaults to the one stored before the current snapshot.
    #[arg(long)]
    prior: Option<String>,

    /// How many movers to show per dimension. Defaults to `top_movers` from config.json.
    #[arg(long)]
    top: Option<usize>,
}

impl CompareArgs {
    pub fn new(current: Option<String>, prior: Option<String>, top: Option<usize>) -> Self {
        Self {
            current,
            prior,
            top,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn prior(&self) -> Option<&str> {
        self.prior.as_deref()
    }

    pub fn top(&self) -> Option<usize> {
        self.top
    }
}

/// Args for the `inflow timeline` command.
#[derive(Debug, Default, Parser, Clone)]
pub struct TimelineArgs {
    /// How many snapshots to include. Defaults to `history_window` from config.json.
    #[arg(long)]
    window: Option<usize>,
}

impl TimelineArgs {
    pub fn new(window: Option<usize>) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Option<usize> {
        self.window
    }
}

/// The output format of `inflow explore`.
#[derive(
    Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

serde_plain::derive_display_from_serialize!(OutputFormat);
serde_plain::derive_fromstr_from_deserialize!(OutputFormat);

/// Args for the `inflow explore` command.
#[derive(Debug, Parser, Clone)]
pub struct ExploreArgs {
    /// The snapshot id. Defaults to the most recent snapshot.
    id: Option<String>,

    /// Only show records where some field contains this text (case-insensitive).
    #[arg(long, default_value = "")]
    search: String,

    /// The field to sort by.
    #[arg(long)]
    sort: Option<RecordField>,

    /// The sort direction.
    #[arg(long, default_value_t = SortDirection::Asc)]
    direction: SortDirection,

    /// The page to show, starting at 1.
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// json prints one page, csv prints every matching record.
    #[arg(long, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

impl Default for ExploreArgs {
    fn default() -> Self {
        Self {
            id: None,
            search: String::new(),
            sort: None,
            direction: SortDirection::Asc,
            page: 1,
            format: OutputFormat::Json,
        }
    }
}

impl ExploreArgs {
    pub fn new(id: Option<String>, search: impl Into<String>) -> Self {
        Self {
            id,
            search: search.into(),
            ..Self::default()
        }
    }

    pub fn with_sort(mut self, field: RecordField, direction: SortDirection) -> Self {
        self.sort = Some(field);
        self.direction = direction;
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn sort(&self) -> Option<(RecordField, SortDirection)> {
        self.sort.map(|field| (field, self.direction))
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

fn default_inflow_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("inflow"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --inflow-home or INFLOW_HOME instead of relying on the default \
                inflow home directory.",
            );
            PathBuf::from("inflow")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_explore() {
        let args = Args::try_parse_from([
            "inflow",
            "--inflow-home",
            "/tmp/x",
            "explore",
            "abc",
            "--search",
            "acme",
            "--sort",
            "branch_office",
            "--direction",
            "desc",
            "--page",
            "2",
            "--format",
            "csv",
        ])
        .unwrap();
        assert_eq!(args.common().inflow_home().path(), Path::new("/tmp/x"));
        let Command::Explore(explore) = args.command() else {
            panic!("expected explore");
        };
        assert_eq!(explore.id(), Some("abc"));
        assert_eq!(explore.search(), "acme");
        assert_eq!(
            explore.sort(),
            Some((RecordField::BranchOffice, SortDirection::Desc))
        );
        assert_eq!(explore.page(), 2);
        assert_eq!(explore.format(), OutputFormat::Csv);
    }

    #[test]
    fn test_parse_digest_sections() {
        let args =
            Args::try_parse_from(["inflow", "digest", "--no-header", "--no-ranking"]).unwrap();
        let Command::Digest(digest) = args.command() else {
            panic!("expected digest");
        };
        assert_eq!(digest.id(), None);
        let sections = digest.sections();
        assert!(!sections.header);
        assert!(sections.volume);
        assert!(sections.metrics);
        assert!(!sections.ranking);
    }

    #[test]
    fn test_parse_shares() {
        let args = Args::try_parse_from(["inflow", "shares"]).unwrap();
        let Command::Shares(shares) = args.command() else {
            panic!("expected shares");
        };
        assert_eq!(shares.dimension(), Dimension::Group);
        assert_eq!(shares.limit(), 30);

        let args =
            Args::try_parse_from(["inflow", "shares", "abc", "--dimension", "model", "--limit", "5"])
                .unwrap();
        let Command::Shares(shares) = args.command() else {
            panic!("expected shares");
        };
        assert_eq!(shares.id(), Some("abc"));
        assert_eq!(shares.dimension(), Dimension::Model);
        assert_eq!(shares.limit(), 5);
    }

    #[test]
    fn test_parse_compare_defaults() {
        let args = Args::try_parse_from(["inflow", "compare", "--top", "3"]).unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::INFO);
        let Command::Compare(compare) = args.command() else {
            panic!("expected compare");
        };
        assert_eq!(compare.current(), None);
        assert_eq!(compare.prior(), None);
        assert_eq!(compare.top(), Some(3));
    }
}
