//! API Key service
//!
//! Issuance, validation, listing and lifecycle operations over a repository.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::domain::api_key::{mask_api_key, ApiKey, ApiKeyRepository, ApiKeyValue};
use crate::domain::DomainError;

use super::generator::ApiKeyGenerator;

/// API Key service for managing API keys
#[derive(Debug)]
pub struct ApiKeyService<R>
where
    R: ApiKeyRepository + ?Sized,
{
    repository: Arc<R>,
    generator: ApiKeyGenerator,
}

impl<R: ApiKeyRepository + ?Sized> ApiKeyService<R> {
    /// Create a new API key service
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            generator: ApiKeyGenerator::new(),
        }
    }

    /// Issue a new API key
    pub async fn issue(&self) -> Result<ApiKey, DomainError> {
        let value = self.generator.generate();
        let masked = mask_api_key(value.as_str());

        let created = self.repository.insert(value).await.inspect_err(|e| {
            warn!("Failed to store API key {}: {}", masked, e);
        })?;

        info!("API key issued: id={}, key={}", created.id(), masked);

        Ok(created)
    }

    /// Validate a presented API key and record the usage on success
    pub async fn validate(&self, candidate: &str) -> Result<ApiKey, DomainError> {
        let value = ApiKeyValue::new(candidate).map_err(DomainError::from)?;
        let masked = mask_api_key(value.as_str());

        debug!("Validating API key: {}", masked);

        let key = self
            .repository
            .find_by_key(&value)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("API key '{}' not found", masked)))?;

        if let Err(e) = key.ensure_usable() {
            warn!("Rejected API key {}: {}", masked, e);
            return Err(e);
        }

        // Deleted between lookup and increment
        let updated = self
            .repository
            .record_usage(&value)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("API key '{}' not found", masked)))?;

        debug!(
            "API key accepted: {}, usage_count={}",
            masked,
            updated.usage_count()
        );

        Ok(updated)
    }

    /// List all API keys
    pub async fn list(&self) -> Result<Vec<ApiKey>, DomainError> {
        self.repository.list_all().await
    }

    /// Count API keys
    pub async fn count(&self) -> Result<usize, DomainError> {
        self.repository.count().await
    }

    /// Deactivate an API key
    pub async fn deactivate(&self, key: &str) -> Result<ApiKey, DomainError> {
        self.set_active(key, false).await
    }

    /// Reactivate an API key
    pub async fn activate(&self, key: &str) -> Result<ApiKey, DomainError> {
        self.set_active(key, true).await
    }

    /// Set the expiry to now plus `days` days
    pub async fn set_expiry_days(&self, key: &str, days: i64) -> Result<ApiKey, DomainError> {
        if days <= 0 {
            return Err(DomainError::invalid_input("days must be a positive integer"));
        }

        let duration = Duration::try_days(days)
            .ok_or_else(|| DomainError::invalid_input("days is out of range"))?;
        let expires_at = Utc::now()
            .checked_add_signed(duration)
            .ok_or_else(|| DomainError::invalid_input("days is out of range"))?;

        let value = lookup_value(key)?;
        info!(
            "Setting API key expiry: key={}, expires_at={}",
            mask_api_key(key),
            expires_at
        );

        self.repository
            .set_expiry(&value, expires_at)
            .await?
            .ok_or_else(|| not_found(key))
    }

    /// Delete an API key
    pub async fn delete(&self, key: &str) -> Result<(), DomainError> {
        let value = lookup_value(key)?;
        info!("Deleting API key: key={}", mask_api_key(key));

        if self.repository.delete(&value).await? {
            Ok(())
        } else {
            Err(not_found(key))
        }
    }

    /// Check that storage is reachable
    pub async fn ping(&self) -> Result<(), DomainError> {
        self.repository.ping().await
    }

    async fn set_active(&self, key: &str, is_active: bool) -> Result<ApiKey, DomainError> {
        let value = lookup_value(key)?;
        info!(
            "Setting API key active flag: key={}, is_active={}",
            mask_api_key(key),
            is_active
        );

        self.repository
            .set_active(&value, is_active)
            .await?
            .ok_or_else(|| not_found(key))
    }
}

/// Resolve a key addressed by path; a value that cannot exist is simply absent
fn lookup_value(key: &str) -> Result<ApiKeyValue, DomainError> {
    ApiKeyValue::new(key).map_err(|_| not_found(key))
}

fn not_found(key: &str) -> DomainError {
    DomainError::not_found(format!("API key '{}' not found", mask_api_key(key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::api_key::{MockApiKeyRepository, API_KEY_PREFIX};
    use crate::infrastructure::api_key::InMemoryApiKeyRepository;
    use regex::Regex;
    use std::collections::HashSet;

    fn create_service() -> ApiKeyService<InMemoryApiKeyRepository> {
        ApiKeyService::new(Arc::new(InMemoryApiKeyRepository::new()))
    }

    fn unknown_key() -> String {
        format!("{}{}", API_KEY_PREFIX, "0".repeat(64))
    }

    #[tokio::test]
    async fn test_issue_format_and_uniqueness() {
        let service = create_service();
        let pattern = Regex::new(r"^sk-itumy-v1-api_[0-9a-f]{64}$").unwrap();

        let mut seen = HashSet::new();
        for _ in 0..25 {
            let key = service.issue().await.unwrap();
            assert!(pattern.is_match(key.value().as_str()));
            assert!(key.is_active());
            assert_eq!(key.usage_count(), 0);
            assert!(key.expires_at().is_none());
            assert!(seen.insert(key.value().as_str().to_string()));
        }
    }

    #[tokio::test]
    async fn test_validate_fresh_key() {
        let service = create_service();
        let key = service.issue().await.unwrap();

        let validated = service.validate(key.value().as_str()).await.unwrap();
        assert_eq!(validated.usage_count(), 1);
        assert!(validated.last_used_at().is_some());
        assert_eq!(validated.prefix(), API_KEY_PREFIX);

        let validated = service.validate(key.value().as_str()).await.unwrap();
        assert_eq!(validated.usage_count(), 2);
    }

    #[tokio::test]
    async fn test_validate_missing_and_malformed() {
        let service = create_service();

        assert!(matches!(
            service.validate("").await,
            Err(DomainError::MissingKey)
        ));
        assert!(matches!(
            service.validate("abc").await,
            Err(DomainError::MalformedKey)
        ));
    }

    #[tokio::test]
    async fn test_validate_unknown_key() {
        let service = create_service();

        assert!(matches!(
            service.validate(&unknown_key()).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_deactivate_and_activate() {
        let service = create_service();
        let key = service.issue().await.unwrap();
        let value = key.value().as_str();

        let deactivated = service.deactivate(value).await.unwrap();
        assert!(!deactivated.is_active());
        assert!(matches!(
            service.validate(value).await,
            Err(DomainError::Inactive)
        ));

        let activated = service.activate(value).await.unwrap();
        assert!(activated.is_active());
        assert_eq!(service.validate(value).await.unwrap().usage_count(), 1);
    }

    #[tokio::test]
    async fn test_lifecycle_on_unknown_key() {
        let service = create_service();

        assert!(matches!(
            service.deactivate(&unknown_key()).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            service.activate("not-a-key").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            service.set_expiry_days(&unknown_key(), 3).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            service.delete(&unknown_key()).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_expired_key_rejected() {
        let repository = Arc::new(InMemoryApiKeyRepository::new());
        let service = ApiKeyService::new(repository.clone());
        let key = service.issue().await.unwrap();

        repository
            .set_expiry(key.value(), Utc::now() - Duration::days(1))
            .await
            .unwrap();

        assert!(matches!(
            service.validate(key.value().as_str()).await,
            Err(DomainError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_inactive_checked_before_expired() {
        let repository = Arc::new(InMemoryApiKeyRepository::new());
        let service = ApiKeyService::new(repository.clone());
        let key = service.issue().await.unwrap();

        repository
            .set_expiry(key.value(), Utc::now() - Duration::days(1))
            .await
            .unwrap();
        service.deactivate(key.value().as_str()).await.unwrap();

        assert!(matches!(
            service.validate(key.value().as_str()).await,
            Err(DomainError::Inactive)
        ));
    }

    #[tokio::test]
    async fn test_set_expiry_days() {
        let service = create_service();
        let key = service.issue().await.unwrap();

        let before = Utc::now();
        let updated = service
            .set_expiry_days(key.value().as_str(), 7)
            .await
            .unwrap();

        let expires_at = updated.expires_at().unwrap();
        assert!(expires_at >= before + Duration::days(7));
        assert!(expires_at <= Utc::now() + Duration::days(7));

        // Still valid
        assert!(service.validate(key.value().as_str()).await.is_ok());
    }

    #[tokio::test]
    async fn test_set_expiry_rejects_non_positive_days() {
        let service = create_service();
        let key = service.issue().await.unwrap();

        for days in [0, -1, -30] {
            assert!(matches!(
                service.set_expiry_days(key.value().as_str(), days).await,
                Err(DomainError::InvalidInput { .. })
            ));
        }

        assert!(matches!(
            service.set_expiry_days(key.value().as_str(), i64::MAX).await,
            Err(DomainError::InvalidInput { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let service = create_service();
        let key = service.issue().await.unwrap();
        let other = service.issue().await.unwrap();

        service.delete(key.value().as_str()).await.unwrap();

        let listed = service.list().await.unwrap();
        assert_eq!(listed, vec![other]);
        assert!(matches!(
            service.validate(key.value().as_str()).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_after_issuance() {
        let service = create_service();

        for _ in 0..4 {
            service.issue().await.unwrap();
        }

        assert_eq!(service.list().await.unwrap().len(), 4);
        assert_eq!(service.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_concurrent_validations() {
        let service = Arc::new(create_service());
        let key = service.issue().await.unwrap();

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let service = service.clone();
                let value = key.value().as_str().to_string();
                tokio::spawn(async move { service.validate(&value).await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        let listed = service.list().await.unwrap();
        assert_eq!(listed[0].usage_count(), 20);
    }

    #[tokio::test]
    async fn test_issue_duplicate_key_surfaces() {
        let mut repository = MockApiKeyRepository::new();
        repository
            .expect_insert()
            .returning(|_| Err(DomainError::duplicate_key("API key already exists")));

        let service = ApiKeyService::new(Arc::new(repository));

        assert!(matches!(
            service.issue().await,
            Err(DomainError::DuplicateKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces() {
        let mut repository = MockApiKeyRepository::new();
        repository
            .expect_find_by_key()
            .returning(|_| Err(DomainError::storage("connection refused")));
        repository.expect_record_usage().never();

        let service = ApiKeyService::new(Arc::new(repository));

        assert!(matches!(
            service.validate(&unknown_key()).await,
            Err(DomainError::Storage { .. })
        ));
    }

    #[tokio::test]
    async fn test_validate_key_deleted_before_usage_update() {
        let mut repository = MockApiKeyRepository::new();
        repository
            .expect_find_by_key()
            .returning(|value| Ok(Some(ApiKey::new(1, value.clone()))));
        repository.expect_record_usage().returning(|_| Ok(None));

        let service = ApiKeyService::new(Arc::new(repository));

        assert!(matches!(
            service.validate(&unknown_key()).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
