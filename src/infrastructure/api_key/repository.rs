//! In-memory API key repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::api_key::{mask_api_key, ApiKey, ApiKeyRepository, ApiKeyValue};
use crate::domain::DomainError;

/// In-memory implementation of ApiKeyRepository
///
/// Records are keyed by their full value; ids come from a process-local
/// sequence so listing can follow insertion order.
#[derive(Debug)]
pub struct InMemoryApiKeyRepository {
    keys: Arc<RwLock<HashMap<String, ApiKey>>>,
    next_id: AtomicI64,
}

impl InMemoryApiKeyRepository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self {
            keys: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicI64::new(1),
        }
    }

    async fn update_with<F>(
        &self,
        value: &ApiKeyValue,
        update: F,
    ) -> Result<Option<ApiKey>, DomainError>
    where
        F: FnOnce(&mut ApiKey) + Send,
    {
        let mut keys = self.keys.write().await;

        Ok(keys.get_mut(value.as_str()).map(|key| {
            update(key);
            key.clone()
        }))
    }
}

impl Default for InMemoryApiKeyRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeyRepository {
    async fn insert(&self, value: ApiKeyValue) -> Result<ApiKey, DomainError> {
        let mut keys = self.keys.write().await;

        if keys.contains_key(value.as_str()) {
            return Err(DomainError::duplicate_key(format!(
                "API key '{}' already exists",
                mask_api_key(value.as_str())
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let api_key = ApiKey::new(id, value);
        keys.insert(api_key.value().as_str().to_string(), api_key.clone());

        Ok(api_key)
    }

    async fn find_by_key(&self, value: &ApiKeyValue) -> Result<Option<ApiKey>, DomainError> {
        let keys = self.keys.read().await;
        Ok(keys.get(value.as_str()).cloned())
    }

    async fn record_usage(&self, value: &ApiKeyValue) -> Result<Option<ApiKey>, DomainError> {
        self.update_with(value, ApiKey::record_usage).await
    }

    async fn set_active(
        &self,
        value: &ApiKeyValue,
        is_active: bool,
    ) -> Result<Option<ApiKey>, DomainError> {
        self.update_with(value, |key| key.set_active(is_active)).await
    }

    async fn set_expiry(
        &self,
        value: &ApiKeyValue,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<ApiKey>, DomainError> {
        self.update_with(value, |key| key.set_expiration(expires_at))
            .await
    }

    async fn delete(&self, value: &ApiKeyValue) -> Result<bool, DomainError> {
        let mut keys = self.keys.write().await;
        Ok(keys.remove(value.as_str()).is_some())
    }

    async fn list_all(&self) -> Result<Vec<ApiKey>, DomainError> {
        let keys = self.keys.read().await;

        let mut result: Vec<ApiKey> = keys.values().cloned().collect();
        result.sort_by_key(ApiKey::id);

        Ok(result)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let keys = self.keys.read().await;
        Ok(keys.len())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::api_key::API_KEY_PREFIX;
    use crate::infrastructure::api_key::ApiKeyGenerator;
    use chrono::Duration;

    fn test_value(fill: char) -> ApiKeyValue {
        ApiKeyValue::new(format!("{}{}", API_KEY_PREFIX, fill.to_string().repeat(64))).unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = InMemoryApiKeyRepository::new();
        let value = test_value('a');

        let created = repo.insert(value.clone()).await.unwrap();
        assert_eq!(created.id(), 1);
        assert!(created.is_active());
        assert_eq!(created.usage_count(), 0);

        let retrieved = repo.find_by_key(&value).await.unwrap();
        assert_eq!(retrieved, Some(created));
    }

    #[tokio::test]
    async fn test_find_missing() {
        let repo = InMemoryApiKeyRepository::new();
        assert!(repo.find_by_key(&test_value('b')).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate() {
        let repo = InMemoryApiKeyRepository::new();

        repo.insert(test_value('c')).await.unwrap();
        let result = repo.insert(test_value('c')).await;

        assert!(matches!(result, Err(DomainError::DuplicateKey { .. })));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_record_usage() {
        let repo = InMemoryApiKeyRepository::new();
        let value = test_value('d');
        repo.insert(value.clone()).await.unwrap();

        let updated = repo.record_usage(&value).await.unwrap().unwrap();
        assert_eq!(updated.usage_count(), 1);
        assert!(updated.last_used_at().is_some());

        let updated = repo.record_usage(&value).await.unwrap().unwrap();
        assert_eq!(updated.usage_count(), 2);

        assert!(repo.record_usage(&test_value('e')).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_active() {
        let repo = InMemoryApiKeyRepository::new();
        let value = test_value('f');
        repo.insert(value.clone()).await.unwrap();

        let updated = repo.set_active(&value, false).await.unwrap().unwrap();
        assert!(!updated.is_active());
        assert!(!repo.find_by_key(&value).await.unwrap().unwrap().is_active());

        let updated = repo.set_active(&value, true).await.unwrap().unwrap();
        assert!(updated.is_active());

        assert!(repo.set_active(&test_value('0'), true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_expiry() {
        let repo = InMemoryApiKeyRepository::new();
        let value = test_value('1');
        repo.insert(value.clone()).await.unwrap();

        let at = Utc::now() + Duration::days(7);
        let updated = repo.set_expiry(&value, at).await.unwrap().unwrap();
        assert_eq!(updated.expires_at(), Some(at));

        assert!(repo.set_expiry(&test_value('2'), at).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = InMemoryApiKeyRepository::new();
        let value = test_value('3');
        repo.insert(value.clone()).await.unwrap();

        assert!(repo.delete(&value).await.unwrap());
        assert!(repo.find_by_key(&value).await.unwrap().is_none());
        assert!(!repo.delete(&value).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_all_insertion_order() {
        let repo = InMemoryApiKeyRepository::new();
        let generator = ApiKeyGenerator::new();

        let mut issued = Vec::new();
        for _ in 0..5 {
            issued.push(repo.insert(generator.generate()).await.unwrap());
        }

        let all = repo.list_all().await.unwrap();
        assert_eq!(all, issued);
        assert_eq!(repo.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_concurrent_usage_is_not_lost() {
        let repo = Arc::new(InMemoryApiKeyRepository::new());
        let value = test_value('4');
        repo.insert(value.clone()).await.unwrap();

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let repo = repo.clone();
                let value = value.clone();
                tokio::spawn(async move { repo.record_usage(&value).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let key = repo.find_by_key(&value).await.unwrap().unwrap();
        assert_eq!(key.usage_count(), 50);
    }
}
