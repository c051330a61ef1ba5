use axum::extract::{
    rejection::{JsonRejection, QueryRejection},
    Extension, Query, State,
};
use axum::Json;
use serde_json::Value;

use crate::database::models::Client;
use crate::handlers::{json_body, query};
use crate::identity::Principal;
use crate::middleware::{ApiResponse, ApiResult};
use crate::scope::ClientFilter;
use crate::services::ClientService;
use crate::AppState;

/// GET /clients - Clients visible to the caller, optionally filtered by
/// exact `last_name` / `email`
pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    filter: Result<Query<ClientFilter>, QueryRejection>,
) -> ApiResult<Vec<Client>> {
    let filter = query(filter)?;
    let clients = ClientService::new(state.store.as_ref(), &state.grants)
        .list(&principal, &filter)
        .await?;
    Ok(ApiResponse::success(clients))
}

/// POST /clients - Create a client owned by the caller
pub async fn post(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Client> {
    let body = json_body(body)?;
    let client = ClientService::new(state.store.as_ref(), &state.grants)
        .create(&principal, &body)
        .await?;
    Ok(ApiResponse::created(client))
}
