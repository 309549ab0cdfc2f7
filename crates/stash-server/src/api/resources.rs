//! Resource API handlers: caller-relative listing, owner bulk save, and
//! collaborator single-item patches.

use crate::api::{identity, response::ApiResponse, state::AppState};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stash_core::{resources, Resource, ResourceView, SharedItemPatch};

/// Body of a bulk owner save
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveOwnedRequest {
    pub resources: Vec<Resource<Value>>,
}

/// List every resource visible to the caller, annotated with `isOwner`
pub async fn list_resources(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<ResourceView<Value>>>>, (StatusCode, String)> {
    let requester = identity::requester_id(&headers)?;
    match resources::list_visible(&state, &requester).await {
        Ok(views) => Ok(Json(ApiResponse::ok(views))),
        Err(e) => Err((identity::error_status(&e), e.to_string())),
    }
}

/// Replace the caller's entire owned set; returns the canonical set
pub async fn save_owned(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SaveOwnedRequest>,
) -> Result<Json<ApiResponse<Vec<Resource<Value>>>>, (StatusCode, String)> {
    let requester = identity::requester_id(&headers)?;
    match resources::save_owned(&state, &requester, payload.resources).await {
        Ok(saved) => Ok(Json(ApiResponse::ok(saved))),
        Err(e) => Err((identity::error_status(&e), e.to_string())),
    }
}

/// Apply a collaborator's patch to one shared item
pub async fn save_shared_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<SharedItemPatch>,
) -> Result<Json<ApiResponse<Resource<Value>>>, (StatusCode, String)> {
    let requester = identity::requester_id(&headers)?;
    match resources::save_shared_item(&state, &id, &requester, patch).await {
        Ok(updated) => Ok(Json(ApiResponse::ok(updated))),
        Err(e) => Err((identity::error_status(&e), e.to_string())),
    }
}
