use axum::extract::{
    rejection::{JsonRejection, QueryRejection},
    Extension, Query, State,
};
use axum::Json;
use serde_json::Value;

use crate::database::models::Contract;
use crate::handlers::{json_body, query};
use crate::identity::Principal;
use crate::middleware::{ApiResponse, ApiResult};
use crate::scope::ContractFilter;
use crate::services::ContractService;
use crate::AppState;

/// GET /contracts - Contracts visible to the caller
///
/// Filters: `last_name`, `email` (contains, on the client), `date_created`,
/// `amount`, `client`.
pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    filter: Result<Query<ContractFilter>, QueryRejection>,
) -> ApiResult<Vec<Contract>> {
    let filter = query(filter)?;
    let contracts = ContractService::new(state.store.as_ref(), &state.grants)
        .list(&principal, &filter)
        .await?;
    Ok(ApiResponse::success(contracts))
}

/// POST /contracts - Create a contract owned by the caller
pub async fn post(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Contract> {
    let body = json_body(body)?;
    let contract = ContractService::new(state.store.as_ref(), &state.grants)
        .create(&principal, &body)
        .await?;
    Ok(ApiResponse::created(contract))
}
