use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Extension, Path, State,
};
use axum::Json;
use serde_json::Value;

use crate::database::models::Event;
use crate::handlers::{json_body, record_id};
use crate::identity::Principal;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::EventService;
use crate::AppState;

/// GET /events/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Event> {
    let id = record_id(id)?;
    let event = EventService::new(state.store.as_ref(), &state.grants)
        .retrieve(&principal, id)
        .await?;
    Ok(ApiResponse::success(event))
}

/// PUT /events/:id
///
/// Support callers must be the event's support contact; sales callers the
/// sales contact of the event's client.
pub async fn put(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Event> {
    let id = record_id(id)?;
    let body = json_body(body)?;
    let event = EventService::new(state.store.as_ref(), &state.grants)
        .update(&principal, id, &body)
        .await?;
    Ok(ApiResponse::success(event))
}
