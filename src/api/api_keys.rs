//! API key issuance, validation and lifecycle endpoints

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, LenientJson};
use crate::domain::api_key::{mask_api_key, ApiKey};
use crate::domain::DomainError;

/// Body of `POST /checkapi`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckApiKeyRequest {
    #[serde(default)]
    pub apikey: Option<Value>,
}

impl CheckApiKeyRequest {
    /// Presented key as text; absent, null, `false` and zero count as empty
    fn candidate(&self) -> String {
        match &self.apikey {
            None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Body of `PATCH /apikeys/{apikey}/expire`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpireApiKeyRequest {
    #[serde(default)]
    pub days: Option<Value>,
}

impl ExpireApiKeyRequest {
    /// Day count given as a JSON integer or a numeric string
    fn days(&self) -> Result<i64, DomainError> {
        let days = match &self.days {
            None | Some(Value::Null) => return Err(DomainError::invalid_input("days is required")),
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            Some(_) => None,
        };

        match days {
            Some(days) if days > 0 => Ok(days),
            _ => Err(DomainError::invalid_input(
                "days must be a positive integer",
            )),
        }
    }
}

/// Listed key record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyResponse {
    pub id: i64,
    pub api_key: String,
    pub prefix: String,
    pub is_active: bool,
    pub usage_count: u64,
    pub created_at: String,
    pub last_used_at: Option<String>,
    pub expires_at: Option<String>,
}

impl ApiKeyResponse {
    fn from_key(key: &ApiKey, redact: bool) -> Self {
        let value = key.value().as_str();

        Self {
            id: key.id(),
            api_key: if redact {
                mask_api_key(value)
            } else {
                value.to_string()
            },
            prefix: key.prefix().to_string(),
            is_active: key.is_active(),
            usage_count: key.usage_count(),
            created_at: key.created_at().to_rfc3339(),
            last_used_at: key.last_used_at().map(|dt| dt.to_rfc3339()),
            expires_at: key.expires_at().map(|dt| dt.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyResponse {
    pub success: bool,
    pub api_key: String,
    pub message: String,
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckApiKeyResponse {
    pub success: bool,
    pub valid: bool,
    pub message: String,
    // Lowercase, as presented in the request
    #[serde(rename = "apikey")]
    pub apikey: String,
    pub prefix: String,
    /// Always true; kept for clients of the earlier response shape
    pub created: bool,
    pub created_at: String,
    pub usage_count: u64,
    pub last_used_at: Option<String>,
    pub is_active: bool,
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListApiKeysResponse {
    pub success: bool,
    pub total: usize,
    pub apikeys: Vec<ApiKeyResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteApiKeyResponse {
    pub success: bool,
    pub message: String,
    pub deleted_key: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyActiveResponse {
    pub success: bool,
    pub api_key: String,
    pub is_active: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyExpiryResponse {
    pub success: bool,
    pub api_key: String,
    pub expires_at: Option<String>,
}

/// POST /create
pub async fn create_api_key(
    State(state): State<AppState>,
) -> Result<Json<CreateApiKeyResponse>, ApiError> {
    debug!("Issuing API key");

    let key = state
        .api_key_service
        .issue()
        .await
        .map_err(ApiError::from)?;

    Ok(Json(CreateApiKeyResponse {
        success: true,
        api_key: key.value().as_str().to_string(),
        message: "API key created successfully".to_string(),
        id: key.id(),
    }))
}

/// POST /checkapi
pub async fn check_api_key(
    State(state): State<AppState>,
    body: Result<LenientJson<CheckApiKeyRequest>, ApiError>,
) -> Result<Json<CheckApiKeyResponse>, ApiError> {
    let LenientJson(request) = body.map_err(ApiError::with_valid_flag)?;
    let candidate = request.candidate();

    debug!(apikey = %mask_api_key(&candidate), "Checking API key");

    let key = state
        .api_key_service
        .validate(&candidate)
        .await
        .map_err(|e| ApiError::from_validation(e, &candidate))?;

    Ok(Json(CheckApiKeyResponse {
        success: true,
        valid: true,
        message: "API key is valid".to_string(),
        apikey: candidate,
        prefix: key.prefix().to_string(),
        created: true,
        created_at: key.created_at().to_rfc3339(),
        usage_count: key.usage_count(),
        last_used_at: key.last_used_at().map(|dt| dt.to_rfc3339()),
        is_active: key.is_active(),
        expires_at: key.expires_at().map(|dt| dt.to_rfc3339()),
    }))
}

/// GET /apikeys
pub async fn list_api_keys(
    State(state): State<AppState>,
) -> Result<Json<ListApiKeysResponse>, ApiError> {
    debug!(redact = state.redact_listing, "Listing API keys");

    let keys = state
        .api_key_service
        .list()
        .await
        .map_err(ApiError::from)?;

    let apikeys: Vec<ApiKeyResponse> = keys
        .iter()
        .map(|key| ApiKeyResponse::from_key(key, state.redact_listing))
        .collect();

    Ok(Json(ListApiKeysResponse {
        success: true,
        total: apikeys.len(),
        apikeys,
    }))
}

/// DELETE /apikeys/{apikey}
pub async fn delete_api_key(
    State(state): State<AppState>,
    Path(apikey): Path<String>,
) -> Result<Json<DeleteApiKeyResponse>, ApiError> {
    debug!(apikey = %mask_api_key(&apikey), "Deleting API key");

    state
        .api_key_service
        .delete(&apikey)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(DeleteApiKeyResponse {
        success: true,
        message: "API key deleted successfully".to_string(),
        deleted_key: apikey,
    }))
}

/// PATCH /apikeys/{apikey}/deactivate
pub async fn deactivate_api_key(
    State(state): State<AppState>,
    Path(apikey): Path<String>,
) -> Result<Json<ApiKeyActiveResponse>, ApiError> {
    debug!(apikey = %mask_api_key(&apikey), "Deactivating API key");

    let key = state
        .api_key_service
        .deactivate(&apikey)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiKeyActiveResponse {
        success: true,
        api_key: key.value().as_str().to_string(),
        is_active: key.is_active(),
        message: "API key deactivated successfully".to_string(),
    }))
}

/// PATCH /apikeys/{apikey}/activate
pub async fn activate_api_key(
    State(state): State<AppState>,
    Path(apikey): Path<String>,
) -> Result<Json<ApiKeyActiveResponse>, ApiError> {
    debug!(apikey = %mask_api_key(&apikey), "Activating API key");

    let key = state
        .api_key_service
        .activate(&apikey)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiKeyActiveResponse {
        success: true,
        api_key: key.value().as_str().to_string(),
        is_active: key.is_active(),
        message: "API key activated successfully".to_string(),
    }))
}

/// PATCH /apikeys/{apikey}/expire
pub async fn expire_api_key(
    State(state): State<AppState>,
    Path(apikey): Path<String>,
    LenientJson(request): LenientJson<ExpireApiKeyRequest>,
) -> Result<Json<ApiKeyExpiryResponse>, ApiError> {
    debug!(apikey = %mask_api_key(&apikey), "Setting API key expiry");

    let days = request.days().map_err(ApiError::from)?;

    let key = state
        .api_key_service
        .set_expiry_days(&apikey, days)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiKeyExpiryResponse {
        success: true,
        api_key: key.value().as_str().to_string(),
        expires_at: key.expires_at().map(|dt| dt.to_rfc3339()),
    }))
}
