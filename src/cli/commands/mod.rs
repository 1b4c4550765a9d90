pub mod admin;
pub mod migrate;

use anyhow::Context;

use crate::config::AppConfig;
use crate::database::Database;

/// Validated configuration plus an eagerly connected pool.
pub(crate) async fn connect() -> anyhow::Result<(AppConfig, Database)> {
    let config = AppConfig::from_env();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    let db = Database::connect(&config.database)
        .await
        .context("could not connect to the database")?;
    Ok((config, db))
}
