//! Infrastructure layer - Storage backends, key generation and logging

pub mod api_key;
pub mod logging;
pub mod storage;
