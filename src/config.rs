//! Configuration file handling.
//!
//! The configuration file is stored at `$INFLOW_HOME/config.json` next to the snapshot database.
//! It holds the aggregation settings and the defaults used by the trend commands.

use crate::aggregate::{AggregateOptions, DEFAULT_TYPE_KEYWORD};
use crate::db::Db;
use crate::model::OutletFallback;
use crate::trend::DEFAULT_TOP_MOVERS;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "inflow";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const INFLOW_SQLITE: &str = "inflow.sqlite";
const HISTORY_WINDOW: usize = 15;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$INFLOW_HOME` and from there it loads `$INFLOW_HOME/config.json` and opens the
/// snapshot database.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    sqlite_path: PathBuf,
}

impl Config {
    /// Creates the home directory along with:
    /// - an initial `config.json` holding default settings
    /// - an empty snapshot database
    ///
    /// # Errors
    /// - Returns an error if the database already exists or any file operation fails.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the inflow home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let sqlite_path = root.join(INFLOW_SQLITE);
        if sqlite_path.exists() {
            bail!("'{}' is already an inflow home directory", root.display())
        }

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        let db = Db::init(&sqlite_path)
            .await
            .context("Unable to create SQLite DB")?;

        Ok(Self {
            root,
            config_path,
            config_file,
            db,
            sqlite_path,
        })
    }

    /// This will
    /// - validate that `inflow_home` exists and that the config file exists
    /// - load the config file
    /// - open the database, migrating it if needed
    pub async fn load(inflow_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = inflow_home.into();
        if !maybe_relative.is_dir() {
            bail!(
                "The inflow home directory is missing '{}', run 'inflow init' first",
                maybe_relative.display()
            )
        }
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let sqlite_path = root.join(INFLOW_SQLITE);
        let db = Db::load(&sqlite_path)
            .await
            .context("Unable to load SQLite DB")?;

        Ok(Self {
            root,
            config_path,
            config_file,
            db,
            sqlite_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn type_keyword(&self) -> &str {
        &self.config_file.type_keyword
    }

    pub fn outlet_fallback(&self) -> OutletFallback {
        self.config_file.outlet_fallback
    }

    /// How many snapshots the timeline looks back over by default.
    pub fn history_window(&self) -> usize {
        self.config_file.history_window
    }

    pub fn top_movers(&self) -> usize {
        self.config_file.top_movers
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            type_keyword: self.config_file.type_keyword.clone(),
            outlet_fallback: self.config_file.outlet_fallback,
        }
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "inflow",
///   "config_version": 1,
///   "type_keyword": "mobile device",
///   "history_window": 15,
///   "top_movers": 10,
///   "outlet_fallback": "main_office"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "inflow"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Records whose type does not contain this keyword are ignored
    #[serde(default = "default_type_keyword")]
    type_keyword: String,

    #[serde(default = "default_history_window")]
    history_window: usize,

    #[serde(default = "default_top_movers")]
    top_movers: usize,

    #[serde(default)]
    outlet_fallback: OutletFallback,
}

fn default_type_keyword() -> String {
    DEFAULT_TYPE_KEYWORD.to_string()
}

fn default_history_window() -> usize {
    HISTORY_WINDOW
}

fn default_top_movers() -> usize {
    DEFAULT_TOP_MOVERS
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            type_keyword: default_type_keyword(),
            history_window: HISTORY_WINDOW,
            top_movers: DEFAULT_TOP_MOVERS,
            outlet_fallback: OutletFallback::default(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or names another application
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path)
            .await
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create_then_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("inflow_home");

        let created = Config::create(&home).await.unwrap();
        assert!(created.config_path().is_file());
        assert!(created.sqlite_path().is_file());
        assert_eq!(created.type_keyword(), "mobile device");

        let loaded = Config::load(&home).await.unwrap();
        assert_eq!(loaded.root(), created.root());
        assert_eq!(loaded.history_window(), 15);
        assert_eq!(loaded.top_movers(), 10);
        assert_eq!(loaded.outlet_fallback(), OutletFallback::MainOffice);
        assert_eq!(loaded.db().count_snapshots().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_config_create_twice_fails() {
        let dir = TempDir::new().unwrap();
        Config::create(dir.path()).await.unwrap();
        assert!(Config::create(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path().join("nope")).await;
        assert!(result.unwrap_err().to_string().contains("inflow init"));
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "inflow",
            "config_version": 1,
            "outlet_fallback": "whole_name"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();

        assert_eq!(config.type_keyword, DEFAULT_TYPE_KEYWORD);
        assert_eq!(config.history_window, 15);
        assert_eq!(config.top_movers, 10);
        assert_eq!(config.outlet_fallback, OutletFallback::WholeName);
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{ "app_name": "tiller", "config_version": 1 }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        let original = ConfigFile {
            type_keyword: "tablet".to_string(),
            history_window: 4,
            ..ConfigFile::default()
        };
        original.save(&path).await.unwrap();
        assert_eq!(ConfigFile::load(&path).await.unwrap(), original);
    }
}
