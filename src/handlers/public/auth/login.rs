// handlers/public/auth/login.rs - POST /login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;

use crate::auth::TokenPair;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::AuthService;
use crate::AppState;

/// POST /login - Exchange credentials for an access/refresh token pair
///
/// Expected Input:
/// ```json
/// { "username": "sales1", "password": "..." }
/// ```
///
/// Expected Output (Success):
/// ```json
/// { "success": true, "data": { "access": "eyJ...", "refresh": "eyJ..." } }
/// ```
///
/// Unknown usernames and wrong passwords are both 400, with
/// `User Does Not Exist` and `Invalid Password` respectively.
pub async fn login_post(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<TokenPair> {
    let body = json_body(body)?;
    let pair = AuthService::new(state.store.as_ref(), &state.keys).login(&body).await?;
    Ok(ApiResponse::success(pair))
}
