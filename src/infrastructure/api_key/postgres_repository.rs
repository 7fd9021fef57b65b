//! PostgreSQL-backed API key repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::api_key::{
    mask_api_key, ApiKey, ApiKeyRepository, ApiKeyValue, API_KEY_PREFIX,
};
use crate::domain::DomainError;

const COLUMNS: &str =
    "id, api_key, prefix, is_active, usage_count, created_at, last_used_at, expires_at";

/// PostgreSQL implementation of ApiKeyRepository over the `api_keys` table
#[derive(Debug, Clone)]
pub struct PostgresApiKeyRepository {
    pool: PgPool,
}

impl PostgresApiKeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_by_key(
        &self,
        query: &str,
        value: &ApiKeyValue,
        action: &str,
    ) -> Result<Option<ApiKey>, DomainError> {
        let row = sqlx::query(query)
            .bind(value.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to {}: {}", action, e)))?;

        row.as_ref().map(row_to_api_key).transpose()
    }
}

fn row_to_api_key(row: &PgRow) -> Result<ApiKey, DomainError> {
    let decode = |e: sqlx::Error| DomainError::storage(format!("Failed to decode api_keys row: {}", e));

    let id: i64 = row.try_get("id").map_err(decode)?;
    let api_key: String = row.try_get("api_key").map_err(decode)?;
    let is_active: bool = row.try_get("is_active").map_err(decode)?;
    let usage_count: i64 = row.try_get("usage_count").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    let last_used_at: Option<DateTime<Utc>> = row.try_get("last_used_at").map_err(decode)?;
    let expires_at: Option<DateTime<Utc>> = row.try_get("expires_at").map_err(decode)?;

    let value = ApiKeyValue::new(api_key).map_err(|e| {
        DomainError::storage(format!("Stored API key {} is invalid: {}", id, e))
    })?;
    let usage_count = u64::try_from(usage_count).map_err(|_| {
        DomainError::storage(format!("Stored API key {} has negative usage count", id))
    })?;

    let mut key = ApiKey::new(id, value)
        .with_created_at(created_at)
        .with_active(is_active)
        .with_usage(usage_count, last_used_at);

    if let Some(expires_at) = expires_at {
        key = key.with_expiration(expires_at);
    }

    Ok(key)
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[async_trait]
impl ApiKeyRepository for PostgresApiKeyRepository {
    async fn insert(&self, value: ApiKeyValue) -> Result<ApiKey, DomainError> {
        let query = format!(
            "INSERT INTO api_keys (api_key, prefix) VALUES ($1, $2) RETURNING {}",
            COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(value.as_str())
            .bind(API_KEY_PREFIX)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::duplicate_key(format!(
                        "API key '{}' already exists",
                        mask_api_key(value.as_str())
                    ))
                } else {
                    DomainError::storage(format!("Failed to insert API key: {}", e))
                }
            })?;

        row_to_api_key(&row)
    }

    async fn find_by_key(&self, value: &ApiKeyValue) -> Result<Option<ApiKey>, DomainError> {
        let query = format!("SELECT {} FROM api_keys WHERE api_key = $1", COLUMNS);
        self.fetch_one_by_key(&query, value, "get API key").await
    }

    async fn record_usage(&self, value: &ApiKeyValue) -> Result<Option<ApiKey>, DomainError> {
        let query = format!(
            r#"
            UPDATE api_keys
            SET usage_count = usage_count + 1, last_used_at = NOW()
            WHERE api_key = $1
            RETURNING {}
            "#,
            COLUMNS
        );
        self.fetch_one_by_key(&query, value, "record API key usage")
            .await
    }

    async fn set_active(
        &self,
        value: &ApiKeyValue,
        is_active: bool,
    ) -> Result<Option<ApiKey>, DomainError> {
        let query = format!(
            "UPDATE api_keys SET is_active = $2 WHERE api_key = $1 RETURNING {}",
            COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(value.as_str())
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to update API key: {}", e)))?;

        row.as_ref().map(row_to_api_key).transpose()
    }

    async fn set_expiry(
        &self,
        value: &ApiKeyValue,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<ApiKey>, DomainError> {
        let query = format!(
            "UPDATE api_keys SET expires_at = $2 WHERE api_key = $1 RETURNING {}",
            COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(value.as_str())
            .bind(expires_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to update API key: {}", e)))?;

        row.as_ref().map(row_to_api_key).transpose()
    }

    async fn delete(&self, value: &ApiKeyValue) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE api_key = $1")
            .bind(value.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete API key: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> Result<Vec<ApiKey>, DomainError> {
        let query = format!(
            "SELECT {} FROM api_keys ORDER BY created_at DESC, id DESC",
            COLUMNS
        );

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list API keys: {}", e)))?;

        rows.iter().map(row_to_api_key).collect()
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM api_keys")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count API keys: {}", e)))?;

        Ok(count.max(0) as usize)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Database unreachable: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_detection_ignores_other_errors() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
    }

    #[test]
    fn test_selected_columns_match_schema() {
        let migrations = crate::infrastructure::storage::migrations::storage_migrations();
        let create = &migrations[0].up;

        for column in COLUMNS.split(", ") {
            assert!(create.contains(column), "column {} not in schema", column);
        }
    }
}
