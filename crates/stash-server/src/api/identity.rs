//! Requester identity extraction.
//!
//! Authentication is handled by an external layer (reverse proxy or
//! session service) which places the authenticated user id in a request
//! header. Handlers thread that id explicitly into every core call;
//! `/api/public` is served without identity.

use axum::http::{HeaderMap, StatusCode};
use stash_core::ShareError;

/// Header carrying the authenticated user id
pub const USER_HEADER: &str = "x-stash-user";

/// Read the requester id from headers, rejecting anonymous API calls.
pub fn requester_id(headers: &HeaderMap) -> Result<String, (StatusCode, String)> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                "Missing user identity".to_string(),
            )
        })
}

/// Map a core sharing error onto an HTTP status.
pub fn error_status(error: &ShareError) -> StatusCode {
    match error {
        ShareError::NotOwner | ShareError::NotCollaborator | ShareError::Forbidden => {
            StatusCode::FORBIDDEN
        }
        ShareError::NotFound(_) | ShareError::UserNotFound(_) => StatusCode::NOT_FOUND,
        ShareError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        ShareError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
