//! API Key entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{validate_api_key, ApiKeyValidationError, API_KEY_PREFIX};
use crate::domain::DomainError;

/// A presented or issued API key value, always starting with [`API_KEY_PREFIX`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApiKeyValue(String);

impl ApiKeyValue {
    /// Create a new ApiKeyValue after format validation
    pub fn new(value: impl Into<String>) -> Result<Self, ApiKeyValidationError> {
        let value = value.into();
        validate_api_key(&value)?;
        Ok(Self(value))
    }

    /// Wrap a value built from [`API_KEY_PREFIX`] by the key generator
    pub(crate) fn from_generated(value: String) -> Self {
        debug_assert!(value.starts_with(API_KEY_PREFIX));
        Self(value)
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Random portion of the key (everything after the prefix)
    pub fn secret_part(&self) -> &str {
        &self.0[API_KEY_PREFIX.len()..]
    }
}

impl TryFrom<String> for ApiKeyValue {
    type Error = ApiKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ApiKeyValue> for String {
    fn from(value: ApiKeyValue) -> Self {
        value.0
    }
}

impl std::fmt::Display for ApiKeyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state derived from the active flag and the expiry timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyStatus {
    Active,
    Inactive,
    Expired,
}

/// Stored API key record
#[derive(Debug, Clone, PartialEq)]
pub struct ApiKey {
    /// Storage-assigned identifier, increasing with insertion order
    id: i64,
    /// Full key value (unique across the store)
    value: ApiKeyValue,
    /// Key prefix, stored redundantly for display
    prefix: String,
    /// Administrative flag gating validation
    is_active: bool,
    /// Number of successful validations
    usage_count: u64,
    /// Insertion timestamp
    created_at: DateTime<Utc>,
    /// Last successful validation
    last_used_at: Option<DateTime<Utc>>,
    /// Expiration timestamp (None = never expires)
    expires_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    /// Create a freshly issued key: active, unused, never expiring
    pub fn new(id: i64, value: ApiKeyValue) -> Self {
        Self {
            id,
            value,
            prefix: API_KEY_PREFIX.to_string(),
            is_active: true,
            usage_count: 0,
            created_at: Utc::now(),
            last_used_at: None,
            expires_at: None,
        }
    }

    /// Set the creation timestamp (used when loading stored rows)
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Set the active flag
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Set usage counters
    pub fn with_usage(mut self, usage_count: u64, last_used_at: Option<DateTime<Utc>>) -> Self {
        self.usage_count = usage_count;
        self.last_used_at = last_used_at;
        self
    }

    /// Set expiration
    pub fn with_expiration(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    // Getters

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn value(&self) -> &ApiKeyValue {
        &self.value
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn usage_count(&self) -> u64 {
        self.usage_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    // Status checks

    /// Check if the key had expired at the given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }

    /// Check if the key has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Current lifecycle state; the inactive flag wins over expiry
    pub fn status(&self) -> ApiKeyStatus {
        if !self.is_active {
            ApiKeyStatus::Inactive
        } else if self.is_expired() {
            ApiKeyStatus::Expired
        } else {
            ApiKeyStatus::Active
        }
    }

    /// Ensure the key may be accepted, in validation order
    pub fn ensure_usable(&self) -> Result<(), DomainError> {
        match self.status() {
            ApiKeyStatus::Active => Ok(()),
            ApiKeyStatus::Inactive => Err(DomainError::Inactive),
            ApiKeyStatus::Expired => Err(DomainError::Expired),
        }
    }

    // Mutators

    /// Record a successful validation
    pub fn record_usage(&mut self) {
        self.usage_count = self.usage_count.saturating_add(1);
        self.last_used_at = Some(Utc::now());
    }

    /// Flip the active flag
    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }

    /// Update expiration
    pub fn set_expiration(&mut self, expires_at: DateTime<Utc>) {
        self.expires_at = Some(expires_at);
    }
}
