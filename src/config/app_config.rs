use serde::Deserialize;
use tracing::warn;

use crate::infrastructure::storage::{PostgresConfig, StorageConfig, StorageType};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageSettings,
    pub keys: KeysConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the landing page and other static assets
    pub static_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Raw storage settings as read from files and environment
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `memory` or `postgres`
    pub backend: String,
    /// Falls back to `DATABASE_URL` when unset
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Mask key values in the listing endpoint
    pub redact_listing: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: "public".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        let pg = PostgresConfig::default();

        Self {
            backend: "memory".to_string(),
            database_url: None,
            max_connections: pg.max_connections,
            min_connections: pg.min_connections,
            connect_timeout_secs: pg.connect_timeout_secs,
            idle_timeout_secs: pg.idle_timeout_secs,
        }
    }
}

impl StorageSettings {
    /// Resolve the settings into a concrete storage configuration
    ///
    /// `env_database_url` is the value of `DATABASE_URL`, consulted when no
    /// URL is configured.
    pub fn resolve(&self, env_database_url: Option<String>) -> Result<StorageConfig, String> {
        let storage_type = StorageType::parse(&self.backend).unwrap_or_else(|| {
            warn!(
                "Unknown storage backend '{}', falling back to in-memory storage",
                self.backend
            );
            StorageType::InMemory
        });

        match storage_type {
            StorageType::InMemory => Ok(StorageConfig::in_memory()),
            StorageType::Postgres => {
                let url = self
                    .database_url
                    .clone()
                    .filter(|url| !url.trim().is_empty())
                    .or(env_database_url.filter(|url| !url.trim().is_empty()))
                    .ok_or_else(|| {
                        "storage.backend is postgres but no database URL is configured \
                         (set storage.database_url or DATABASE_URL)"
                            .to_string()
                    })?;

                Ok(StorageConfig::postgres(
                    PostgresConfig::new(url)
                        .with_max_connections(self.max_connections)
                        .with_min_connections(self.min_connections)
                        .with_connect_timeout(self.connect_timeout_secs)
                        .with_idle_timeout(self.idle_timeout_secs),
                ))
            }
        }
    }
}

impl AppConfig {
    /// Load from `config/default`, `config/local` and `APP__*` environment variables
    ///
    /// Any unparsable value is an error; nothing falls back to defaults silently.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with_env(Self::environment())
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true)
    }

    fn load_with_env(env: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    /// Storage configuration, consulting `DATABASE_URL` as a fallback
    pub fn storage_config(&self) -> Result<StorageConfig, String> {
        self.storage.resolve(std::env::var("DATABASE_URL").ok())
    }
}
