use axum::extract::{Extension, State};
use serde_json::{json, Value};

use crate::identity::Principal;
use crate::middleware::{ApiResponse, ApiResult};
use crate::AppState;

/// GET /me - The authenticated principal and the grants its team carries
pub async fn me_get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Value> {
    let grants: Vec<&str> = state
        .grants
        .grants_for(principal.team)
        .iter()
        .map(|g| g.name())
        .collect();

    Ok(ApiResponse::success(json!({
        "id": principal.id,
        "username": principal.username,
        "team": principal.team.map(|t| t.as_str()),
        "grants": grants,
    })))
}
