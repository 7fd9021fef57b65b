//! JSON error bodies for the key endpoints

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::domain::DomainError;

/// Error body: `{success:false, message, error, valid?, apikey?}`
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub message: String,
    /// Stable snake_case error code
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apikey: Option<String>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                success: false,
                message: message.into(),
                error: code.into(),
                valid: None,
                apikey: None,
            },
        }
    }

    /// Mark the body as a failed validation (`valid: false`)
    pub fn with_valid_flag(mut self) -> Self {
        self.response.valid = Some(false);
        self
    }

    /// Echo the presented key back to the caller
    pub fn with_apikey(mut self, apikey: impl Into<String>) -> Self {
        self.response.apikey = Some(apikey.into());
        self
    }

    /// Bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_input", message)
    }

    /// Convert a rejected validation of `apikey`
    ///
    /// Unknown, inactive and expired keys are authentication failures here
    /// rather than missing resources.
    pub fn from_validation(err: DomainError, apikey: &str) -> Self {
        let rejected = matches!(
            err,
            DomainError::NotFound { .. } | DomainError::Inactive | DomainError::Expired
        );

        let api_error = if rejected {
            let message = match &err {
                DomainError::NotFound { .. } => "API key not found".to_string(),
                other => other.to_string(),
            };
            Self::new(StatusCode::UNAUTHORIZED, err.code(), message).with_apikey(apikey)
        } else {
            Self::from(err)
        };

        api_error.with_valid_flag()
    }
}

fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::MissingKey | DomainError::MalformedKey | DomainError::InvalidInput { .. } => {
            StatusCode::BAD_REQUEST
        }
        DomainError::Inactive | DomainError::Expired => StatusCode::UNAUTHORIZED,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::DuplicateKey { .. } => StatusCode::CONFLICT,
        DomainError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let status = status_for(&err);

        let message = match &err {
            DomainError::Storage { message } => {
                error!("Storage failure: {}", message);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        Self::new(status, err.code(), message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.response.error, self.response.message)
    }
}

impl std::error::Error for ApiError {}
