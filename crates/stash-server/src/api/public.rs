//! Anonymous public-token endpoint.
//!
//! No authentication, no identifying information in the response. A token
//! that never existed and a token whose sharing was disabled both come
//! back as 404, so the endpoint cannot be used to probe token existence.

use crate::api::{response::ApiResponse, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use stash_core::{viewer, PublicResourceView, ShareError};

/// Resolve a public token to a sanitized snapshot
pub async fn resolve_public(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<PublicResourceView<Value>>>, (StatusCode, String)> {
    match viewer::resolve(&state, &token).await {
        Ok(view) => Ok(Json(ApiResponse::ok(view))),
        Err(ShareError::NotFound(_)) | Err(ShareError::Forbidden) => {
            Err((StatusCode::NOT_FOUND, "Not found".to_string()))
        }
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}
