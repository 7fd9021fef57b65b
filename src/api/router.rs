use std::path::Path;

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{delete, get, get_service, patch, post},
    Router,
};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info_span;

use super::api_keys;
use super::health;
use super::middleware::{logging_middleware, redact_api_keys};
use super::state::AppState;

/// Routes for key issuance, validation and lifecycle
fn api_key_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(api_keys::create_api_key))
        .route("/checkapi", post(api_keys::check_api_key))
        .route("/apikeys", get(api_keys::list_api_keys))
        .route("/apikeys/{apikey}", delete(api_keys::delete_api_key))
        .route(
            "/apikeys/{apikey}/deactivate",
            patch(api_keys::deactivate_api_key),
        )
        .route(
            "/apikeys/{apikey}/activate",
            patch(api_keys::activate_api_key),
        )
        .route("/apikeys/{apikey}/expire", patch(api_keys::expire_api_key))
}

/// Create the full router with application state
///
/// `/` serves `index.html` from `static_dir`; unmatched paths fall through to
/// the other files there.
pub fn create_router(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let static_dir = static_dir.as_ref();

    Router::new()
        // Landing page
        .route("/", get_service(ServeFile::new(static_dir.join("index.html"))))
        .merge(api_key_routes())
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .fallback_service(ServeDir::new(static_dir))
        // Add state and middleware
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %redact_api_keys(&request.uri().to_string()),
                )
            }),
        )
}
