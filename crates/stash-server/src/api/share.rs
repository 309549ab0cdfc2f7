//! Sharing API handler. Sharing actions execute immediately; clients
//! refetch the resource list afterwards to reconcile collaborator lists
//! and tokens across tabs.

use crate::api::{identity, response::ApiResponse, state::AppState};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use stash_core::{gateway, ShareOutcome, ShareRequest};

/// Execute a grant / revoke / leave / public-toggle / collection grant
pub async fn share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ShareRequest>,
) -> Result<Json<ApiResponse<ShareOutcome>>, (StatusCode, String)> {
    let requester = identity::requester_id(&headers)?;
    match gateway::share(&state, &requester, request).await {
        Ok(outcome) => Ok(Json(ApiResponse::ok(outcome))),
        Err(e) => Err((identity::error_status(&e), e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;
    use stash_core::{resources, users, AppCore, Resource, ResourceKind};
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    async fn create_test_app() -> (Arc<AppCore>, TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let app = Arc::new(AppCore::new(db_path.to_str().unwrap()).await.unwrap());
        (app, temp_dir)
    }

    fn as_user(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(identity::USER_HEADER, HeaderValue::from_str(id).unwrap());
        headers
    }

    async fn seed_resource(app: &Arc<AppCore>, owner: &str) -> String {
        let resource = Resource::new(owner, ResourceKind::Links, "Reading", json!([]));
        let saved = resources::save_owned(app, owner, vec![resource])
            .await
            .unwrap();
        saved[0].id.clone().unwrap()
    }

    #[tokio::test]
    async fn test_grant_unknown_user_is_distinct() {
        let (app, _tmp_dir) = create_test_app().await;
        let id = seed_resource(&app, "owner-1").await;

        let result = share(
            State(app),
            as_user("owner-1"),
            Json(ShareRequest::add(&id, "ghost")),
        )
        .await;
        assert!(result.is_err());
        if let Err((status, message)) = result {
            // UserNotFound surfaces with a message the UI can use to
            // prompt for a corrected username
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert!(message.contains("ghost"));
        }
    }

    #[tokio::test]
    async fn test_non_owner_cannot_share() {
        let (app, _tmp_dir) = create_test_app().await;
        users::register(&app, "alice").await.unwrap();
        let id = seed_resource(&app, "owner-1").await;

        let result = share(
            State(app),
            as_user("intruder"),
            Json(ShareRequest::add(&id, "alice")),
        )
        .await;
        assert!(result.is_err());
        if let Err((status, _)) = result {
            assert_eq!(status, StatusCode::FORBIDDEN);
        }
    }

    #[tokio::test]
    async fn test_public_toggle_returns_token() {
        let (app, _tmp_dir) = create_test_app().await;
        let id = seed_resource(&app, "owner-1").await;

        let outcome = share(
            State(app.clone()),
            as_user("owner-1"),
            Json(ShareRequest::public_toggle(&id)),
        )
        .await
        .unwrap()
        .0
        .data
        .unwrap();
        assert_eq!(outcome.is_public, Some(true));
        assert!(outcome.public_token.is_some());

        let outcome = share(
            State(app),
            as_user("owner-1"),
            Json(ShareRequest::public_toggle(&id)),
        )
        .await
        .unwrap()
        .0
        .data
        .unwrap();
        assert_eq!(outcome.is_public, Some(false));
    }
}
