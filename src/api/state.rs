//! Application state for shared services

use std::sync::Arc;

use crate::domain::api_key::ApiKeyRepository;
use crate::domain::{ApiKey, DomainError};
use crate::infrastructure::api_key::ApiKeyService;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub api_key_service: Arc<dyn ApiKeyServiceTrait>,
    /// Mask key values in the listing endpoint
    pub redact_listing: bool,
}

impl AppState {
    pub fn new(api_key_service: Arc<dyn ApiKeyServiceTrait>) -> Self {
        Self {
            api_key_service,
            redact_listing: false,
        }
    }

    pub fn with_redact_listing(mut self, redact_listing: bool) -> Self {
        self.redact_listing = redact_listing;
        self
    }
}

/// Trait for API key service operations
#[async_trait::async_trait]
pub trait ApiKeyServiceTrait: Send + Sync {
    async fn issue(&self) -> Result<ApiKey, DomainError>;
    async fn validate(&self, candidate: &str) -> Result<ApiKey, DomainError>;
    async fn list(&self) -> Result<Vec<ApiKey>, DomainError>;
    async fn deactivate(&self, key: &str) -> Result<ApiKey, DomainError>;
    async fn activate(&self, key: &str) -> Result<ApiKey, DomainError>;
    async fn set_expiry_days(&self, key: &str, days: i64) -> Result<ApiKey, DomainError>;
    async fn delete(&self, key: &str) -> Result<(), DomainError>;
    async fn ping(&self) -> Result<(), DomainError>;
}

#[async_trait::async_trait]
impl<R: ApiKeyRepository + ?Sized + 'static> ApiKeyServiceTrait for ApiKeyService<R> {
    async fn issue(&self) -> Result<ApiKey, DomainError> {
        ApiKeyService::issue(self).await
    }

    async fn validate(&self, candidate: &str) -> Result<ApiKey, DomainError> {
        ApiKeyService::validate(self, candidate).await
    }

    async fn list(&self) -> Result<Vec<ApiKey>, DomainError> {
        ApiKeyService::list(self).await
    }

    async fn deactivate(&self, key: &str) -> Result<ApiKey, DomainError> {
        ApiKeyService::deactivate(self, key).await
    }

    async fn activate(&self, key: &str) -> Result<ApiKey, DomainError> {
        ApiKeyService::activate(self, key).await
    }

    async fn set_expiry_days(&self, key: &str, days: i64) -> Result<ApiKey, DomainError> {
        ApiKeyService::set_expiry_days(self, key, days).await
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        ApiKeyService::delete(self, key).await
    }

    async fn ping(&self) -> Result<(), DomainError> {
        ApiKeyService::ping(self).await
    }
}
