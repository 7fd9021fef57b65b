//! API Key generation
//!
//! Keys are the fixed prefix followed by lowercase hex of fresh random bytes.

use rand::RngCore;

use crate::domain::api_key::{ApiKeyValue, API_KEY_PREFIX, API_KEY_RANDOM_BYTES};

/// Generator for secure API keys
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiKeyGenerator;

impl ApiKeyGenerator {
    /// Create a new API key generator
    pub fn new() -> Self {
        Self
    }

    /// Generate a new API key from [`API_KEY_RANDOM_BYTES`] bytes of OS-seeded randomness
    pub fn generate(&self) -> ApiKeyValue {
        let mut random_bytes = [0u8; API_KEY_RANDOM_BYTES];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        ApiKeyValue::from_generated(format!("{}{}", API_KEY_PREFIX, hex::encode(random_bytes)))
    }
}
