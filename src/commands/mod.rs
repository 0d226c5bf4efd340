//! Command handlers for the inflow CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod explore;
mod ingest;
mod init;
mod snapshots;
mod trend;

use crate::db::Db;
use crate::model::StatsSnapshot;
use crate::store::SnapshotStore;
use crate::Result;
use anyhow::bail;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use explore::{digest, explore, ExploreOutput};
pub use ingest::{ingest, IngestReport};
pub use init::init;
pub use snapshots::{delete, list, schema, shares, show};
pub use trend::{compare, timeline};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data or rendered text.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,

    /// Output that is already rendered, such as CSV. Printed as-is instead of `structure`.
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
            text: None,
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
            text: None,
        }
    }

    /// Attach pre-rendered text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Logs the message to `info!` and prints the output to stdout: the rendered text if there is
    /// any, otherwise the structured data as pretty JSON.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(text) = self.text() {
            println!("{text}");
        } else if let Some(structure) = self.structure() {
            match serde_json::to_string_pretty(structure) {
                Ok(json) => println!("{json}"),
                Err(e) => debug!("Unable to serialize command output: {e}"),
            }
        }
    }
}

/// Loads the snapshot named by `id`, or the most recent snapshot when `id` is `None`.
pub(crate) async fn snapshot_or_latest(db: &Db, id: Option<&str>) -> Result<StatsSnapshot> {
    let id = match id {
        Some(id) => id.to_string(),
        None => match db.list_metadata().await?.into_iter().next() {
            Some(latest) => latest.id,
            None => bail!("No snapshots have been ingested yet"),
        },
    };
    require(db, &id).await
}

/// Loads the snapshot named by `id`, turning a missing snapshot into an error.
pub(crate) async fn require(db: &Db, id: &str) -> Result<StatsSnapshot> {
    match db.load_payload(id).await? {
        Some(snapshot) => Ok(snapshot),
        None => bail!("There is no snapshot with id '{id}'"),
    }
}
