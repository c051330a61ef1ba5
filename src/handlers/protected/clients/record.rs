use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Extension, Path, State,
};
use axum::Json;
use serde_json::Value;

use crate::database::models::{Client, ClientDetail};
use crate::handlers::{json_body, record_id};
use crate::identity::Principal;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ClientService;
use crate::AppState;

/// GET /clients/:id - Client detail with linked event and contract ids
pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<ClientDetail> {
    let id = record_id(id)?;
    let detail = ClientService::new(state.store.as_ref(), &state.grants)
        .retrieve(&principal, id)
        .await?;
    Ok(ApiResponse::success(detail))
}

/// PUT /clients/:id - Replace a client's writable fields
///
/// 405 without `change_client`, 403 unless the caller is the sales contact.
pub async fn put(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Client> {
    let id = record_id(id)?;
    let body = json_body(body)?;
    let client = ClientService::new(state.store.as_ref(), &state.grants)
        .update(&principal, id, &body)
        .await?;
    Ok(ApiResponse::success(client))
}
