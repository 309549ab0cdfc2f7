//! Public Viewer: unauthenticated, read-only resolution of public tokens.
//!
//! `NotFound` (token unknown) and `Forbidden` (token bound but sharing
//! since disabled) are distinct here for diagnostics; the HTTP layer
//! collapses both into the same response so token existence cannot be
//! probed.

use crate::error::{Result, ShareError};
use crate::models::PublicResourceView;
use crate::resources::load;
use crate::AppCore;
use serde_json::Value;
use std::sync::Arc;

/// Resolve a public token to a sanitized resource snapshot.
pub async fn resolve(core: &Arc<AppCore>, token: &str) -> Result<PublicResourceView<Value>> {
    let id = core
        .storage
        .resources
        .resolve_token(token)
        .map_err(ShareError::Storage)?
        .ok_or_else(|| ShareError::NotFound("token".to_string()))?;

    let resource = load(core, &id)?;
    // The index is released together with the resource record, so a stale
    // entry should not happen; refuse to serve one anyway
    if !resource.is_public || resource.public_token.as_deref() != Some(token) {
        return Err(ShareError::Forbidden);
    }

    Ok(PublicResourceView::of(resource))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Resource, ResourceKind};
    use crate::resources::save_owned;
    use crate::{ledger, users};
    use serde_json::json;
    use tempfile::{tempdir, TempDir};

    async fn create_test_core() -> (Arc<AppCore>, TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let core = Arc::new(AppCore::new(db_path.to_str().unwrap()).await.unwrap());
        (core, temp_dir)
    }

    async fn seed_public(core: &Arc<AppCore>) -> (String, String) {
        let resource = Resource::new(
            "owner-1",
            ResourceKind::Clipboard,
            "Scratch",
            json!({ "text": "hello" }),
        );
        let saved = save_owned(core, "owner-1", vec![resource]).await.unwrap();
        let id = saved[0].id.clone().unwrap();
        let resource = ledger::set_public(core, &id, "owner-1", true).await.unwrap();
        (id, resource.public_token.unwrap())
    }

    #[tokio::test]
    async fn test_resolve_returns_sanitized_payload() {
        let (core, _tmp_dir) = create_test_core().await;
        users::register(&core, "alice").await.unwrap();
        let (id, token) = seed_public(&core).await;
        ledger::grant(&core, &id, "owner-1", "alice").await.unwrap();

        let view = resolve(&core, &token).await.unwrap();
        assert_eq!(view.payload["text"], "hello");

        let serialized = serde_json::to_value(&view).unwrap();
        assert!(serialized.get("ownerId").is_none());
        assert!(serialized.get("sharedWith").is_none());
        assert!(serialized.get("id").is_none());
        assert!(serialized.get("publicToken").is_none());
    }

    #[tokio::test]
    async fn test_unknown_token_not_found() {
        let (core, _tmp_dir) = create_test_core().await;
        let result = resolve(&core, "0000000000000000").await;
        assert!(matches!(result, Err(ShareError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_disabled_token_never_serves_stale_payload() {
        let (core, _tmp_dir) = create_test_core().await;
        let (id, token) = seed_public(&core).await;

        ledger::set_public(&core, &id, "owner-1", false)
            .await
            .unwrap();

        let result = resolve(&core, &token).await;
        assert!(matches!(
            result,
            Err(ShareError::NotFound(_)) | Err(ShareError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_deleted_resource_token_gone() {
        let (core, _tmp_dir) = create_test_core().await;
        let (_id, token) = seed_public(&core).await;

        // Owner resends an empty set: resource deleted, token released
        save_owned(&core, "owner-1", vec![]).await.unwrap();

        let result = resolve(&core, &token).await;
        assert!(matches!(result, Err(ShareError::NotFound(_))));
    }
}
