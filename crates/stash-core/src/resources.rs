//! Resource Store service: owner bulk upsert, collaborator item patch, and
//! caller-relative listing.
//!
//! `save_owned` deliberately replaces the owner's whole set in one call -
//! the set is small and cheap to resend, so there is no per-item diffing.
//! `save_shared_item` is the narrower collaborator path: a single-item
//! payload patch that cannot clobber sibling resources or sharing state.

use crate::error::{Result, ShareError};
use crate::models::{Resource, ResourceView, SharedItemPatch};
use crate::AppCore;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Load a resource by id, failing with `NotFound` if absent.
pub(crate) fn load(core: &Arc<AppCore>, id: &str) -> Result<Resource<Value>> {
    let data = core
        .storage
        .resources
        .get(id)
        .map_err(ShareError::Storage)?
        .ok_or_else(|| ShareError::NotFound(id.to_string()))?;
    Resource::from_bytes(&data).map_err(ShareError::Storage)
}

/// Persist a resource record (plain write, no token index change).
pub(crate) fn store(core: &Arc<AppCore>, resource: &Resource<Value>) -> Result<()> {
    let id = resource
        .id
        .as_deref()
        .ok_or_else(|| ShareError::InvalidRequest("Resource has no id".to_string()))?;
    let data = resource.to_bytes().map_err(ShareError::Storage)?;
    core.storage
        .resources
        .put(id, &data)
        .map_err(ShareError::Storage)?;
    Ok(())
}

/// Load every stored resource. Undecodable records are skipped with a
/// warning rather than failing the whole listing.
pub(crate) fn load_all(core: &Arc<AppCore>) -> Result<Vec<Resource<Value>>> {
    let mut resources = Vec::new();
    for (id, data) in core
        .storage
        .resources
        .list()
        .map_err(ShareError::Storage)?
    {
        match Resource::from_bytes(&data) {
            Ok(resource) => resources.push(resource),
            Err(e) => warn!("Skipping undecodable resource {}: {}", id, e),
        }
    }
    Ok(resources)
}

/// List every resource visible to a user (owned or granted), annotated with
/// the caller-relative `is_owner` flag.
pub async fn list_visible(core: &Arc<AppCore>, user_id: &str) -> Result<Vec<ResourceView<Value>>> {
    let views = load_all(core)?
        .into_iter()
        .filter(|r| r.owner_id == user_id || r.is_shared_with(user_id))
        .map(|r| r.into_view(user_id))
        .collect();
    Ok(views)
}

/// Replace an owner's entire owned set.
///
/// Assigns ids to new resources and returns the saved set in submission
/// order with canonical ids and tokens, so the caller can reconcile
/// identifiers for newly created items. Sharing state (`shared_with`,
/// `is_public`, `public_token`, `owner_id`) is server-authoritative:
/// client-sent values are ignored and the stored values survive the
/// replace. Resources omitted from the call are deleted, their grants
/// implicitly revoked and their public tokens released.
pub async fn save_owned(
    core: &Arc<AppCore>,
    owner_id: &str,
    incoming: Vec<Resource<Value>>,
) -> Result<Vec<Resource<Value>>> {
    let existing: HashMap<String, Resource<Value>> = load_all(core)?
        .into_iter()
        .filter(|r| r.owner_id == owner_id)
        .filter_map(|r| r.id.clone().map(|id| (id, r)))
        .collect();

    // Validate every submitted id before any write so a rejected set
    // leaves the store untouched. An id we do not hold for this owner is
    // either someone else's resource or a stale identifier.
    for resource in &incoming {
        if let Some(id) = &resource.id {
            if !existing.contains_key(id)
                && core
                    .storage
                    .resources
                    .exists(id)
                    .map_err(ShareError::Storage)?
            {
                return Err(ShareError::Forbidden);
            }
        }
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut saved = Vec::with_capacity(incoming.len());

    for mut resource in incoming {
        let resource = match resource.id.take() {
            Some(id) if existing.contains_key(&id) => {
                // Surviving resource: content fields come from the client,
                // sharing state and creation time from the store
                let mut stored = existing.get(&id).cloned().unwrap_or(resource.clone());
                stored.name = resource.name;
                stored.kind = resource.kind;
                stored.collection = resource.collection;
                stored.payload = resource.payload;
                stored.is_hidden = resource.is_hidden;
                stored.touch();
                stored
            }
            Some(id) => {
                debug!("Recreating resource {} for {}", id, owner_id);
                resource.id = Some(id);
                fresh(resource, owner_id)
            }
            None => {
                resource.id = Some(uuid::Uuid::new_v4().to_string());
                fresh(resource, owner_id)
            }
        };

        if let Some(id) = &resource.id {
            seen.insert(id.clone());
        }
        store(core, &resource)?;
        saved.push(resource);
    }

    // Full-set replace: whatever the owner no longer sends is gone, along
    // with its grants and public token
    for (id, resource) in existing {
        if !seen.contains(&id) {
            debug!("Deleting resource {} omitted by {}", id, owner_id);
            core.storage
                .resources
                .remove(&id, resource.public_token.as_deref())
                .map_err(ShareError::Storage)?;
        }
    }

    Ok(saved)
}

/// Apply a collaborator's allow-listed patch to a single shared item.
///
/// Fails with `Forbidden` unless the requester is the owner or holds a
/// grant. Only `name` and `payload` are applied; sharing state and
/// ownership are untouchable through this path.
pub async fn save_shared_item(
    core: &Arc<AppCore>,
    resource_id: &str,
    requester_id: &str,
    patch: SharedItemPatch,
) -> Result<Resource<Value>> {
    let mut resource = load(core, resource_id)?;

    if resource.owner_id != requester_id && !resource.is_shared_with(requester_id) {
        return Err(ShareError::Forbidden);
    }

    if let Some(name) = patch.name {
        resource.name = name;
    }
    if let Some(payload) = patch.payload {
        resource.payload = payload;
    }
    resource.touch();

    store(core, &resource)?;
    Ok(resource)
}

/// Reset a submitted resource to an unshared state owned by `owner_id`
fn fresh(mut resource: Resource<Value>, owner_id: &str) -> Resource<Value> {
    resource.owner_id = owner_id.to_string();
    resource.shared_with = Vec::new();
    resource.is_public = false;
    resource.public_token = None;
    resource.created_at = chrono::Utc::now().timestamp_millis();
    resource.updated_at = resource.created_at;
    resource
}
