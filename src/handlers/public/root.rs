use axum::extract::State;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::AppState;

/// GET / - Service descriptor
pub async fn root_get() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "name": "CRM API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "public": ["POST /login", "POST /login/refresh", "GET /health"],
            "protected": [
                "GET /me",
                "GET|POST /clients", "GET|PUT /clients/:id",
                "GET|POST /contracts", "GET|PUT /contracts/:id",
                "GET|POST /events", "GET|PUT /events/:id"
            ]
        }
    })))
}

/// GET /health - Store connectivity probe
pub async fn health_get(State(state): State<AppState>) -> ApiResult<Value> {
    match state.store.health_check().await {
        Ok(()) => Ok(ApiResponse::success(json!({ "status": "ok" }))),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            Err(ApiError::service_unavailable("Store unavailable"))
        }
    }
}
