//! API key format validation

use thiserror::Error;

use crate::domain::DomainError;

/// Fixed leading substring of every issued key
pub const API_KEY_PREFIX: &str = "sk-itumy-v1-api_";

/// Number of random bytes behind each key (hex-encoded to twice as many chars)
pub const API_KEY_RANDOM_BYTES: usize = 32;

/// Errors that can occur when checking a presented key's format
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiKeyValidationError {
    #[error("API key cannot be empty")]
    Empty,

    #[error("API key must start with '{API_KEY_PREFIX}'")]
    MissingPrefix,
}

impl From<ApiKeyValidationError> for DomainError {
    fn from(err: ApiKeyValidationError) -> Self {
        match err {
            ApiKeyValidationError::Empty => DomainError::MissingKey,
            ApiKeyValidationError::MissingPrefix => DomainError::MalformedKey,
        }
    }
}

/// Validate a presented API key
///
/// Only the emptiness and the prefix are checked; whatever follows the prefix
/// is resolved by the storage lookup.
pub fn validate_api_key(value: &str) -> Result<(), ApiKeyValidationError> {
    if value.is_empty() {
        return Err(ApiKeyValidationError::Empty);
    }

    if !value.starts_with(API_KEY_PREFIX) {
        return Err(ApiKeyValidationError::MissingPrefix);
    }

    Ok(())
}

/// Short, loggable form of a key: prefix plus the first 8 random characters
pub fn mask_api_key(value: &str) -> String {
    let visible = value
        .char_indices()
        .nth(API_KEY_PREFIX.len() + 8)
        .map(|(idx, _)| idx)
        .unwrap_or(value.len());

    if visible == value.len() {
        value.to_string()
    } else {
        format!("{}…", &value[..visible])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        assert!(validate_api_key(&format!("{}{}", API_KEY_PREFIX, "a".repeat(64))).is_ok());
        // Prefix alone passes the format check; the lookup rejects it
        assert!(validate_api_key(API_KEY_PREFIX).is_ok());
    }

    #[test]
    fn test_empty_key() {
        assert_eq!(validate_api_key(""), Err(ApiKeyValidationError::Empty));
    }

    #[test]
    fn test_missing_prefix() {
        assert_eq!(
            validate_api_key("abc"),
            Err(ApiKeyValidationError::MissingPrefix)
        );
        assert_eq!(
            validate_api_key("sk-itumy-v2-api_deadbeef"),
            Err(ApiKeyValidationError::MissingPrefix)
        );
        assert_eq!(
            validate_api_key(" sk-itumy-v1-api_deadbeef"),
            Err(ApiKeyValidationError::MissingPrefix)
        );
    }

    #[test]
    fn test_domain_error_conversion() {
        assert!(matches!(
            DomainError::from(ApiKeyValidationError::Empty),
            DomainError::MissingKey
        ));
        assert!(matches!(
            DomainError::from(ApiKeyValidationError::MissingPrefix),
            DomainError::MalformedKey
        ));
    }

    #[test]
    fn test_mask_api_key() {
        let key = format!("{}{}", API_KEY_PREFIX, "0123456789abcdef".repeat(4));
        assert_eq!(mask_api_key(&key), format!("{}01234567…", API_KEY_PREFIX));
        assert_eq!(mask_api_key("short"), "short");
    }
}
