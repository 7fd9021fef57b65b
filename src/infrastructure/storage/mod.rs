//! Storage infrastructure - backend selection, pooling and schema

mod factory;
pub mod migrations;
mod postgres;

pub use factory::{ApiKeyRepositoryFactory, StorageConfig, StorageType};
pub use migrations::{run_storage_migrations, Migration, PostgresMigrator};
pub use postgres::PostgresConfig;
