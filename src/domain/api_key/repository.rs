//! API Key repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

use super::entity::{ApiKey, ApiKeyValue};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Repository trait for API key storage
///
/// Lookups are exact matches on the full key value. Mutating operations
/// return `Ok(None)` (or `Ok(false)`) when no record holds the key.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ApiKeyRepository: Send + Sync + Debug {
    /// Insert a freshly issued key, assigning its id and creation time
    async fn insert(&self, value: ApiKeyValue) -> Result<ApiKey, DomainError>;

    /// Get an API key by its full value
    async fn find_by_key(&self, value: &ApiKeyValue) -> Result<Option<ApiKey>, DomainError>;

    /// Increment the usage counter and stamp `last_used_at` in one step
    async fn record_usage(&self, value: &ApiKeyValue) -> Result<Option<ApiKey>, DomainError>;

    /// Set the active flag
    async fn set_active(
        &self,
        value: &ApiKeyValue,
        is_active: bool,
    ) -> Result<Option<ApiKey>, DomainError>;

    /// Set the expiration timestamp
    async fn set_expiry(
        &self,
        value: &ApiKeyValue,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<ApiKey>, DomainError>;

    /// Delete an API key
    async fn delete(&self, value: &ApiKeyValue) -> Result<bool, DomainError>;

    /// List every stored key
    async fn list_all(&self) -> Result<Vec<ApiKey>, DomainError>;

    /// Count stored keys
    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.list_all().await?.len())
    }

    /// Check that the backing store is reachable
    async fn ping(&self) -> Result<(), DomainError>;
}
