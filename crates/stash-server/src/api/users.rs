//! User directory handlers: registration and username lookup.

use crate::api::{identity, response::ApiResponse, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use stash_core::{users, User};

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
}

/// Register a new user with a unique username
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<User>>, (StatusCode, String)> {
    match users::register(&state, &payload.username).await {
        Ok(user) => Ok(Json(ApiResponse::ok(user))),
        Err(e) => Err((identity::error_status(&e), e.to_string())),
    }
}

/// Look up a user by username
pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<User>>, (StatusCode, String)> {
    match users::resolve(&state, &username).await {
        Ok(Some(user)) => Ok(Json(ApiResponse::ok(user))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            format!("User {} not found", username),
        )),
        Err(e) => Err((identity::error_status(&e), e.to_string())),
    }
}
