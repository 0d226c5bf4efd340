use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory along with an initial `config.json` holding default settings and
/// an empty snapshot database.
///
/// # Arguments
/// - `inflow_home` - The directory that will be the root of data directory, e.g. `$HOME/inflow`
///
/// # Errors
/// - Returns an error if the directory already holds a database or any file operations fail.
pub async fn init(inflow_home: &Path) -> Result<Out<()>> {
    let config = Config::create(inflow_home)
        .await
        .context("Unable to create the data directory and configs")?;
    Ok(format!(
        "Successfully created the inflow directory at {}",
        config.root().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("inflow");
        let out = init(&home).await.unwrap();
        assert!(out.message().contains("Successfully created"));
        assert!(home.join("config.json").is_file());
        assert!(home.join("inflow.sqlite").is_file());
        assert!(init(&home).await.is_err());
    }
}
