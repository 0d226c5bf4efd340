//! This module is responsible for reading, writing and managing the SQLite database that holds
//! snapshot metadata (`reports`) and snapshot payloads (`stats`).

mod migrations;

use crate::model::{SnapshotMetadata, StatsSnapshot};
use crate::store::SnapshotStore;
use crate::Result;
use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub(crate) struct Db {
    pool: SqlitePool,
}

impl Db {
    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema
    pub(crate) async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at {}", path.display());
        }
        let pool = connect(path, true).await?;
        migrations::bootstrap(&pool).await?;
        migrations::run(&pool, 0, migrations::CURRENT_VERSION).await?;
        info!("Created snapshot database at {}", path.display());
        Ok(Self { pool })
    }

    /// - Validates that there is a SQLite file at `path`
    /// - Updates the database schema with migrations if it is out-of-date
    pub(crate) async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The database file is missing '{}'", path.display());
        }
        let pool = connect(path, false).await?;
        let current = migrations::version(&pool).await?;
        if current > migrations::CURRENT_VERSION {
            bail!(
                "The database schema version {current} is newer than this program supports ({})",
                migrations::CURRENT_VERSION
            );
        }
        migrations::run(&pool, current, migrations::CURRENT_VERSION).await?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub(crate) async fn count_snapshots(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reports")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count snapshots")?;
        Ok(row.0 as u64)
    }

    #[cfg(test)]
    pub(crate) async fn count_payloads(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stats")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count payloads")?;
        Ok(row.0 as u64)
    }
}

#[async_trait]
impl SnapshotStore for Db {
    async fn save(&self, snapshot: &StatsSnapshot, filename: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        // created_at is stored as INTEGER milliseconds
        let timestamp = Utc::now().trunc_subsecs(3);
        let stored = snapshot.with_identity(&id, timestamp);
        let payload = serde_json::to_string(&stored).context("Unable to serialize snapshot")?;

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin save transaction")?;

        sqlx::query(
            "INSERT INTO reports (id, filename, created_at, total, top_group, health_score) \
            VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(filename)
        .bind(timestamp.timestamp_millis())
        .bind(snapshot.total as i64)
        .bind(snapshot.top_group.as_str())
        .bind(i64::from(snapshot.health_score))
        .execute(&mut *tx)
        .await
        .context("Failed to insert snapshot metadata")?;

        sqlx::query("INSERT INTO stats (id, payload) VALUES (?, ?)")
            .bind(id.as_str())
            .bind(payload)
            .execute(&mut *tx)
            .await
            .context("Failed to insert snapshot payload")?;

        tx.commit()
            .await
            .context("Failed to commit save transaction")?;

        debug!("Saved snapshot {id} from '{filename}' ({} records)", snapshot.total);
        Ok(id)
    }

    async fn list_metadata(&self) -> Result<Vec<SnapshotMetadata>> {
        let rows: Vec<(String, String, i64, i64, String, i64)> = sqlx::query_as(
            "SELECT id, filename, created_at, total, top_group, health_score FROM reports \
            ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list snapshots")?;

        rows.into_iter()
            .map(|(id, filename, created_at, total, top_group, health_score)| {
                let timestamp = DateTime::<Utc>::from_timestamp_millis(created_at)
                    .with_context(|| format!("Snapshot {id} has an invalid timestamp"))?;
                Ok(SnapshotMetadata {
                    id,
                    filename,
                    timestamp,
                    total: total as u64,
                    top_group,
                    health_score: health_score as u32,
                })
            })
            .collect()
    }

    async fn load_payload(&self, id: &str) -> Result<Option<StatsSnapshot>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT payload FROM stats WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to load snapshot {id}"))?;

        match row {
            None => Ok(None),
            Some((payload,)) => {
                let snapshot = serde_json::from_str(&payload)
                    .with_context(|| format!("The payload for snapshot {id} is corrupt"))?;
                Ok(Some(snapshot))
            }
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin delete transaction")?;

        let reports = sqlx::query("DELETE FROM reports WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete snapshot metadata")?;

        sqlx::query("DELETE FROM stats WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete snapshot payload")?;

        tx.commit()
            .await
            .context("Failed to commit delete transaction")?;

        if reports.rows_affected() == 0 {
            debug!("Snapshot {id} did not exist, nothing deleted");
        }
        Ok(())
    }
}

async fn connect(path: &Path, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create);
    SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .with_context(|| format!("Unable to open SQLite database at {}", path.display()))
}
