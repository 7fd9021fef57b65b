//! API Key domain
//!
//! Key values, stored records, format validation and the storage seam.

mod entity;
mod repository;
mod validation;

pub use entity::{ApiKey, ApiKeyStatus, ApiKeyValue};
#[cfg(test)]
pub use repository::MockApiKeyRepository;
pub use repository::ApiKeyRepository;
pub use validation::{
    mask_api_key, validate_api_key, ApiKeyValidationError, API_KEY_PREFIX, API_KEY_RANDOM_BYTES,
};
