//! Migrate command - applies pending PostgreSQL migrations

use anyhow::{bail, Context};
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::storage::{run_storage_migrations, PostgresMigrator, StorageConfig};

/// Apply pending migrations against the configured database and exit
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.logging);

    let pg_config = match config.storage_config().map_err(anyhow::Error::msg)? {
        StorageConfig::Postgres(pg_config) => pg_config,
        StorageConfig::InMemory => {
            bail!("migrate requires storage.backend = \"postgres\"")
        }
    };

    let pool = pg_config
        .connect()
        .await
        .context("Failed to connect to PostgreSQL")?;

    let applied = run_storage_migrations(&pool)
        .await
        .context("Failed to apply migrations")?;

    let version = PostgresMigrator::new(pool)
        .current_version()
        .await
        .context("Failed to read schema version")?;

    info!(
        "Applied {} migration(s); schema version is {}",
        applied,
        version.map_or_else(|| "none".to_string(), |v| v.to_string())
    );

    Ok(())
}
