use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("API key is required")]
    MissingKey,

    #[error("API key format is invalid")]
    MalformedKey,

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("API key is inactive")]
    Inactive,

    #[error("API key has expired")]
    Expired,

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Duplicate key: {message}")]
    DuplicateKey { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn duplicate_key(message: impl Into<String>) -> Self {
        Self::DuplicateKey {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Stable snake_case code used in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingKey => "missing_key",
            Self::MalformedKey => "malformed_key",
            Self::NotFound { .. } => "not_found",
            Self::Inactive => "inactive",
            Self::Expired => "expired",
            Self::InvalidInput { .. } => "invalid_input",
            Self::DuplicateKey { .. } => "duplicate_key",
            Self::Storage { .. } => "storage_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("API key 'sk-itumy-v1-api_abc' not found");
        assert_eq!(
            error.to_string(),
            "Not found: API key 'sk-itumy-v1-api_abc' not found"
        );
    }

    #[test]
    fn test_invalid_input_error() {
        let error = DomainError::invalid_input("days must be a positive integer");
        assert_eq!(
            error.to_string(),
            "Invalid input: days must be a positive integer"
        );
    }

    #[test]
    fn test_duplicate_key_error() {
        let error = DomainError::duplicate_key("key already exists");
        assert_eq!(error.to_string(), "Duplicate key: key already exists");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(DomainError::MissingKey.code(), "missing_key");
        assert_eq!(DomainError::MalformedKey.code(), "malformed_key");
        assert_eq!(DomainError::not_found("x").code(), "not_found");
        assert_eq!(DomainError::Inactive.code(), "inactive");
        assert_eq!(DomainError::Expired.code(), "expired");
        assert_eq!(DomainError::invalid_input("x").code(), "invalid_input");
        assert_eq!(DomainError::duplicate_key("x").code(), "duplicate_key");
        assert_eq!(DomainError::storage("x").code(), "storage_failure");
    }
}
