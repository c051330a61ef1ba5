use axum::extract::{
    rejection::{JsonRejection, QueryRejection},
    Extension, Query, State,
};
use axum::Json;
use serde_json::Value;

use crate::database::models::Event;
use crate::handlers::{json_body, query};
use crate::identity::Principal;
use crate::middleware::{ApiResponse, ApiResult};
use crate::scope::EventFilter;
use crate::services::EventService;
use crate::AppState;

/// GET /events - Events visible to the caller
///
/// Filters: `event_date`, `client__last_name`, `client__email`.
pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    filter: Result<Query<EventFilter>, QueryRejection>,
) -> ApiResult<Vec<Event>> {
    let filter = query(filter)?;
    let events = EventService::new(state.store.as_ref(), &state.grants)
        .list(&principal, &filter)
        .await?;
    Ok(ApiResponse::success(events))
}

/// POST /events - Create an event for a client holding a signed contract
pub async fn post(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Event> {
    let body = json_body(body)?;
    let event = EventService::new(state.store.as_ref(), &state.grants)
        .create(&principal, &body)
        .await?;
    Ok(ApiResponse::created(event))
}
