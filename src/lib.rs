//! Itumy Keys
//!
//! API key issuance and validation service:
//! - Keys of the form `sk-itumy-v1-api_<64 hex>` minted from a secure RNG
//! - Validation with usage tracking and active/expiry lifecycle
//! - In-memory or PostgreSQL storage

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use anyhow::Context;
use api::state::AppState;
use infrastructure::{api_key::ApiKeyService, storage::ApiKeyRepositoryFactory};
use tracing::info;

/// Create the application state with the default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = config
        .storage_config()
        .map_err(anyhow::Error::msg)
        .context("Invalid storage configuration")?;

    let repository = ApiKeyRepositoryFactory::create(&storage_config)
        .await
        .context("Failed to initialize API key storage")?;

    let service = ApiKeyService::new(repository);
    let stored_keys = service
        .count()
        .await
        .context("Failed to read API key storage")?;

    info!(
        backend = ?storage_config.storage_type(),
        stored_keys,
        redact_listing = config.keys.redact_listing,
        "Application state initialized"
    );

    Ok(AppState::new(Arc::new(service)).with_redact_listing(config.keys.redact_listing))
}
