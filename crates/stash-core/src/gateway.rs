//! Sharing Gateway: request/response wrapper around the ledger, plus
//! collection-level bulk grants.
//!
//! Sharing actions always execute immediately - they never pass through
//! the sync client's debounce.

use crate::error::{Result, ShareError};
use crate::models::{ShareActionKind, ShareOutcome, ShareRequest};
use crate::resources::{load_all, store};
use crate::{ledger, users, AppCore};
use std::sync::Arc;
use tracing::{info, warn};

/// Dispatch a sharing request on behalf of a requester.
pub async fn share(
    core: &Arc<AppCore>,
    requester_id: &str,
    request: ShareRequest,
) -> Result<ShareOutcome> {
    // Collection-level requests only support grants
    if let Some(collection) = &request.collection {
        if request.action != ShareActionKind::Add {
            return Err(ShareError::InvalidRequest(
                "Collections only support add".to_string(),
            ));
        }
        let username = required_username(&request)?;
        let granted = grant_to_collection(core, collection, requester_id, username).await?;
        return Ok(ShareOutcome {
            granted: Some(granted),
            ..ShareOutcome::default()
        });
    }

    let resource_id = request
        .resource_id
        .as_deref()
        .ok_or_else(|| ShareError::InvalidRequest("Missing resource id".to_string()))?;

    match request.action {
        ShareActionKind::Add => {
            let username = required_username(&request)?;
            ledger::grant(core, resource_id, requester_id, username).await?;
            Ok(ShareOutcome::default())
        }
        ShareActionKind::Remove => {
            let username = required_username(&request)?;
            ledger::revoke(core, resource_id, requester_id, username).await?;
            Ok(ShareOutcome::default())
        }
        ShareActionKind::Leave => {
            ledger::leave(core, resource_id, requester_id).await?;
            Ok(ShareOutcome::default())
        }
        ShareActionKind::PublicToggle => {
            let current = crate::resources::load(core, resource_id)?.is_public;
            let resource = ledger::set_public(core, resource_id, requester_id, !current).await?;
            Ok(ShareOutcome {
                is_public: Some(resource.is_public),
                public_token: resource.public_token,
                granted: None,
            })
        }
    }
}

/// Grant a user on every resource the requester owns in a collection.
///
/// Best-effort fan-out, not a transaction: a failure on one member is
/// logged and skipped, and the call reports how many resources were
/// actually granted. Already-present grants are skipped, not errors.
pub async fn grant_to_collection(
    core: &Arc<AppCore>,
    collection: &str,
    requester_id: &str,
    username: &str,
) -> Result<usize> {
    let target = users::resolve(core, username)
        .await?
        .ok_or_else(|| ShareError::UserNotFound(username.to_string()))?;

    let members: Vec<_> = load_all(core)?
        .into_iter()
        .filter(|r| r.owner_id == requester_id && r.collection.as_deref() == Some(collection))
        .collect();

    if members.is_empty() {
        return Err(ShareError::NotFound(collection.to_string()));
    }

    let mut granted = 0;
    for mut resource in members {
        if target.id == resource.owner_id || resource.is_shared_with(&target.id) {
            continue;
        }
        resource.add_grant(target.id.clone(), target.username.clone());
        match store(core, &resource) {
            Ok(()) => granted += 1,
            Err(e) => warn!(
                "Collection grant skipped resource {:?}: {}",
                resource.id, e
            ),
        }
    }

    info!(
        "Granted {} on {} resources in collection {}",
        username, granted, collection
    );
    Ok(granted)
}

fn required_username(request: &ShareRequest) -> Result<&str> {
    request
        .username
        .as_deref()
        .ok_or_else(|| ShareError::InvalidRequest("Missing username".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Resource, ResourceKind};
    use crate::resources::save_owned;
    use serde_json::json;
    use tempfile::{tempdir, TempDir};

    async fn create_test_core() -> (Arc<AppCore>, TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let core = Arc::new(AppCore::new(db_path.to_str().unwrap()).await.unwrap());
        (core, temp_dir)
    }

    fn command(owner: &str, name: &str, collection: Option<&str>) -> Resource<serde_json::Value> {
        let mut resource =
            Resource::new(owner, ResourceKind::Commands, name, json!({ "command": "ls" }));
        resource.collection = collection.map(String::from);
        resource
    }

    #[tokio::test]
    async fn test_share_add_and_remove() {
        let (core, _tmp_dir) = create_test_core().await;
        users::register(&core, "alice").await.unwrap();
        let saved = save_owned(&core, "owner-1", vec![command("owner-1", "Deploy", None)])
            .await
            .unwrap();
        let id = saved[0].id.clone().unwrap();

        share(&core, "owner-1", ShareRequest::add(&id, "alice"))
            .await
            .unwrap();
        let resource = crate::resources::load(&core, &id).unwrap();
        assert_eq!(resource.shared_with.len(), 1);

        share(&core, "owner-1", ShareRequest::remove(&id, "alice"))
            .await
            .unwrap();
        let resource = crate::resources::load(&core, &id).unwrap();
        assert!(resource.shared_with.is_empty());
    }

    #[tokio::test]
    async fn test_public_toggle_flips_state() {
        let (core, _tmp_dir) = create_test_core().await;
        let saved = save_owned(&core, "owner-1", vec![command("owner-1", "Deploy", None)])
            .await
            .unwrap();
        let id = saved[0].id.clone().unwrap();

        let outcome = share(&core, "owner-1", ShareRequest::public_toggle(&id))
            .await
            .unwrap();
        assert_eq!(outcome.is_public, Some(true));
        assert!(outcome.public_token.is_some());

        let outcome = share(&core, "owner-1", ShareRequest::public_toggle(&id))
            .await
            .unwrap();
        assert_eq!(outcome.is_public, Some(false));
        assert!(outcome.public_token.is_none());
    }

    #[tokio::test]
    async fn test_collection_grant_fans_out() {
        let (core, _tmp_dir) = create_test_core().await;
        users::register(&core, "alice").await.unwrap();
        save_owned(
            &core,
            "owner-1",
            vec![
                command("owner-1", "Deploy", Some("ops")),
                command("owner-1", "Restart", Some("ops")),
                command("owner-1", "Unrelated", Some("misc")),
            ],
        )
        .await
        .unwrap();

        let outcome = share(
            &core,
            "owner-1",
            ShareRequest::add_collection("ops", "alice"),
        )
        .await
        .unwrap();
        assert_eq!(outcome.granted, Some(2));

        // Fan-out again: existing grants are skipped, still success
        let outcome = share(
            &core,
            "owner-1",
            ShareRequest::add_collection("ops", "alice"),
        )
        .await
        .unwrap();
        assert_eq!(outcome.granted, Some(0));
    }

    #[tokio::test]
    async fn test_collection_grant_unknown_collection() {
        let (core, _tmp_dir) = create_test_core().await;
        users::register(&core, "alice").await.unwrap();

        let result = share(
            &core,
            "owner-1",
            ShareRequest::add_collection("nothing-here", "alice"),
        )
        .await;
        assert!(matches!(result, Err(ShareError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_collection_grant_unknown_user() {
        let (core, _tmp_dir) = create_test_core().await;
        save_owned(&core, "owner-1", vec![command("owner-1", "Deploy", Some("ops"))])
            .await
            .unwrap();

        let result = share(
            &core,
            "owner-1",
            ShareRequest::add_collection("ops", "ghost"),
        )
        .await;
        assert!(matches!(result, Err(ShareError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let (core, _tmp_dir) = create_test_core().await;
        let request = ShareRequest {
            resource_id: None,
            collection: None,
            action: ShareActionKind::Leave,
            username: None,
        };
        let result = share(&core, "owner-1", request).await;
        assert!(matches!(result, Err(ShareError::InvalidRequest(_))));
    }
}
