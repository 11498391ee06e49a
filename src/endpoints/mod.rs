pub mod auth;
pub mod incidents;
pub mod organizations;
pub mod public;
pub mod realtime;
pub mod services;

use axum::{middleware as axum_middleware, Json, Router};
use serde::Serialize;
use tower_http::normalize_path::NormalizePath;

use crate::config::CONFIG;
use crate::middleware::require_auth;
use crate::state::AppState;

/// Standard success envelope: `{success: true, message?, data}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: None,
            data,
        })
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: Some(message.into()),
            data,
        })
    }
}

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required): health, auth, the public status page
    // projections and the realtime socket (anonymous page viewers subscribe).
    let public_routes = Router::new()
        .route("/api/health", axum::routing::get(health_check))
        .route("/api/version", axum::routing::get(get_version))
        .nest("/api/auth", auth::auth_routes(state.clone()))
        .nest("/api/public", public::public_routes(state.clone()))
        .nest("/api/realtime", realtime::realtime_routes(state.clone()));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .nest("/api", api_routes(state.clone()))
        .layer(axum_middleware::from_fn_with_state(state, require_auth));

    // Tolerate trailing slashes on collection roots (e.g. `/api/organizations/`),
    // matching the lenient routing of the original Express service. NormalizePath
    // must run before routing, so wrap the merged router as a fallback service.
    let app = public_routes.merge(protected_routes);
    Router::new().fallback_service(NormalizePath::trim_trailing_slash(app))
}

/// API routes under /api/* (protected by auth middleware)
fn api_routes(state: AppState) -> Router {
    Router::new()
        .nest(
            "/organizations",
            organizations::organizations_routes(state.clone()),
        )
        .nest("/services", services::services_routes(state.clone()))
        .nest("/incidents", incidents::incidents_routes(state.clone()))
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "message": "Server is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Version info endpoint
async fn get_version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "version": CONFIG.version,
        "backend": "rust",
    }))
}
