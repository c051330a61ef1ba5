// handlers/public/auth/refresh.rs - POST /login/refresh handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;

use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::auth::AccessToken;
use crate::services::AuthService;
use crate::AppState;

/// POST /login/refresh - Mint a new access token from `{"refresh": "..."}`
pub async fn refresh_post(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<AccessToken> {
    let body = json_body(body)?;
    let token = AuthService::new(state.store.as_ref(), &state.keys).refresh(&body).await?;
    Ok(ApiResponse::success(token))
}
