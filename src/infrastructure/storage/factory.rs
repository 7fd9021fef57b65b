//! Storage factory for runtime backend selection

use std::sync::Arc;

use tracing::info;

use crate::domain::api_key::ApiKeyRepository;
use crate::domain::DomainError;
use crate::infrastructure::api_key::{InMemoryApiKeyRepository, PostgresApiKeyRepository};

use super::migrations::run_storage_migrations;
use super::postgres::PostgresConfig;

/// Supported storage types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage configuration
    InMemory,
    /// PostgreSQL storage configuration
    Postgres(PostgresConfig),
}

impl StorageConfig {
    /// Creates an in-memory storage configuration
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Creates a PostgreSQL storage configuration
    pub fn postgres(config: PostgresConfig) -> Self {
        Self::Postgres(config)
    }

    /// Returns the storage type
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// Factory for API key repositories
#[derive(Debug)]
pub struct ApiKeyRepositoryFactory;

impl ApiKeyRepositoryFactory {
    /// Creates a repository for the configured backend
    ///
    /// For PostgreSQL this opens the pool and applies pending migrations.
    pub async fn create(config: &StorageConfig) -> Result<Arc<dyn ApiKeyRepository>, DomainError> {
        match config {
            StorageConfig::InMemory => {
                info!("Using in-memory API key storage");
                Ok(Arc::new(InMemoryApiKeyRepository::new()))
            }
            StorageConfig::Postgres(pg_config) => {
                let repository = Self::create_postgres(pg_config).await?;
                Ok(Arc::new(repository))
            }
        }
    }

    /// Creates a PostgreSQL repository with its schema in place
    pub async fn create_postgres(
        config: &PostgresConfig,
    ) -> Result<PostgresApiKeyRepository, DomainError> {
        let pool = config.connect().await?;
        let applied = run_storage_migrations(&pool).await?;
        info!(
            "Using PostgreSQL API key storage ({} migrations applied)",
            applied
        );

        Ok(PostgresApiKeyRepository::new(pool))
    }
}
