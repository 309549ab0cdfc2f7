//! Access Control Ledger: per-resource record of owner identity,
//! collaborator grants, and public-sharing state.
//!
//! Every operation takes an explicit `requester_id` rather than reading
//! ambient session state, so the protocol stays testable without an
//! authentication layer.

use crate::error::{Result, ShareError};
use crate::models::Resource;
use crate::resources::{load, store};
use crate::{token, users, AppCore};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Grant a collaborator by username. Owner only; idempotent.
pub async fn grant(
    core: &Arc<AppCore>,
    resource_id: &str,
    requester_id: &str,
    target_username: &str,
) -> Result<Resource<Value>> {
    let mut resource = load(core, resource_id)?;
    if resource.owner_id != requester_id {
        return Err(ShareError::NotOwner);
    }

    let target = users::resolve(core, target_username)
        .await?
        .ok_or_else(|| ShareError::UserNotFound(target_username.to_string()))?;

    // The owner is implicitly granted and never appears in shared_with
    if target.id != resource.owner_id {
        resource.add_grant(target.id, target.username);
        store(core, &resource)?;
        info!("Granted {} on {}", target_username, resource_id);
    }
    Ok(resource)
}

/// Revoke a collaborator by username. Owner only; no error if absent.
pub async fn revoke(
    core: &Arc<AppCore>,
    resource_id: &str,
    requester_id: &str,
    target_username: &str,
) -> Result<Resource<Value>> {
    let mut resource = load(core, resource_id)?;
    if resource.owner_id != requester_id {
        return Err(ShareError::NotOwner);
    }

    resource.remove_grant_by_username(target_username);
    store(core, &resource)?;
    info!("Revoked {} on {}", target_username, resource_id);
    Ok(resource)
}

/// Remove the requester's own grant. Fails for the owner and for users
/// without a grant.
pub async fn leave(
    core: &Arc<AppCore>,
    resource_id: &str,
    requester_id: &str,
) -> Result<Resource<Value>> {
    let mut resource = load(core, resource_id)?;
    if resource.owner_id == requester_id || !resource.is_shared_with(requester_id) {
        return Err(ShareError::NotCollaborator);
    }

    resource.remove_grant_by_user(requester_id);
    store(core, &resource)?;
    info!("User {} left {}", requester_id, resource_id);
    Ok(resource)
}

/// Enable or disable anonymous public access. Owner only.
///
/// Enabling issues a fresh unguessable token and binds it in the token
/// index; disabling discards the token, which never resolves again. A
/// later re-enable gets a brand new token.
pub async fn set_public(
    core: &Arc<AppCore>,
    resource_id: &str,
    requester_id: &str,
    enabled: bool,
) -> Result<Resource<Value>> {
    let mut resource = load(core, resource_id)?;
    if resource.owner_id != requester_id {
        return Err(ShareError::NotOwner);
    }

    match (enabled, resource.public_token.clone()) {
        (true, Some(_)) => {
            // Already public: nothing to do
        }
        (true, None) => {
            let token = issue_unique(core)?;
            resource.is_public = true;
            resource.public_token = Some(token.clone());
            resource.touch();
            let data = resource.to_bytes().map_err(ShareError::Storage)?;
            core.storage
                .resources
                .put_and_bind_token(resource_id, &data, &token)
                .map_err(ShareError::Storage)?;
            info!("Enabled public sharing on {}", resource_id);
        }
        (false, Some(token)) => {
            resource.is_public = false;
            resource.public_token = None;
            resource.touch();
            let data = resource.to_bytes().map_err(ShareError::Storage)?;
            core.storage
                .resources
                .put_and_release_token(resource_id, &data, &token)
                .map_err(ShareError::Storage)?;
            info!("Disabled public sharing on {}", resource_id);
        }
        (false, None) => {
            // Already private: nothing to do
        }
    }

    Ok(resource)
}

/// Draw tokens until one is free in the index. A collision on 128 bits of
/// entropy is effectively impossible, but the bind would fail loudly, so
/// check first.
fn issue_unique(core: &Arc<AppCore>) -> Result<String> {
    loop {
        let token = token::issue();
        if core
            .storage
            .resources
            .resolve_token(&token)
            .map_err(ShareError::Storage)?
            .is_none()
        {
            return Ok(token);
        }
    }
}
