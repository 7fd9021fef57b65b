//! Domain layer - Core business logic and entities

pub mod api_key;
pub mod error;

pub use api_key::{
    mask_api_key, validate_api_key, ApiKey, ApiKeyRepository, ApiKeyStatus,
    ApiKeyValidationError, ApiKeyValue, API_KEY_PREFIX, API_KEY_RANDOM_BYTES,
};
pub use error::DomainError;
