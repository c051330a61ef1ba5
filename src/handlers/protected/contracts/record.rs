use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Extension, Path, State,
};
use axum::Json;
use serde_json::Value;

use crate::database::models::Contract;
use crate::handlers::{json_body, record_id};
use crate::identity::Principal;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ContractService;
use crate::AppState;

/// GET /contracts/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Contract> {
    let id = record_id(id)?;
    let contract = ContractService::new(state.store.as_ref(), &state.grants)
        .retrieve(&principal, id)
        .await?;
    Ok(ApiResponse::success(contract))
}

/// PUT /contracts/:id
pub async fn put(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Contract> {
    let id = record_id(id)?;
    let body = json_body(body)?;
    let contract = ContractService::new(state.store.as_ref(), &state.grants)
        .update(&principal, id, &body)
        .await?;
    Ok(ApiResponse::success(contract))
}
