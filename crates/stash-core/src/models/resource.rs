//! Shareable resource envelope and its projections.
//!
//! A resource is the generic unit of the sharing protocol: a clipboard, a
//! link collection, or a command entry. The protocol never inspects
//! `payload`; everything it needs lives in the envelope.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

/// Kind of shareable resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Clipboard,
    Links,
    Commands,
}

/// A collaborator grant, unique per user id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareGrant {
    pub user_id: String,
    pub username: String,
}

/// A shareable resource, generic over its feature-specific payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource<P> {
    /// Assigned by the store on first persistence; absent until then
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub owner_id: String,
    pub kind: ResourceKind,
    pub name: String,
    /// Collection tag, the target of collection-level bulk grants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    pub payload: P,
    #[serde(default)]
    pub shared_with: Vec<ShareGrant>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_token: Option<String>,
    /// Owner-local visibility flag, orthogonal to sharing
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl<P> Resource<P> {
    /// Create a fresh, unshared resource for an owner
    pub fn new(owner_id: impl Into<String>, kind: ResourceKind, name: impl Into<String>, payload: P) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            id: None,
            owner_id: owner_id.into(),
            kind,
            name: name.into(),
            collection: None,
            payload,
            shared_with: Vec::new(),
            is_public: false,
            public_token: None,
            is_hidden: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// True if the user holds a collaborator grant (the owner is implicit
    /// and never appears in `shared_with`)
    pub fn is_shared_with(&self, user_id: &str) -> bool {
        self.shared_with.iter().any(|g| g.user_id == user_id)
    }

    /// Add a collaborator grant. Adding an already-present user is a no-op.
    pub fn add_grant(&mut self, user_id: impl Into<String>, username: impl Into<String>) {
        let user_id = user_id.into();
        if !self.is_shared_with(&user_id) {
            self.shared_with.push(ShareGrant {
                user_id,
                username: username.into(),
            });
        }
    }

    /// Remove the grant matching a username. No error if absent.
    pub fn remove_grant_by_username(&mut self, username: &str) {
        self.shared_with.retain(|g| g.username != username);
    }

    /// Remove the grant matching a user id. No error if absent.
    pub fn remove_grant_by_user(&mut self, user_id: &str) {
        self.shared_with.retain(|g| g.user_id != user_id);
    }

    /// Bump the modification timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().timestamp_millis();
    }

    /// Project this resource relative to a viewing user
    pub fn into_view(self, user_id: &str) -> ResourceView<P> {
        let is_owner = self.owner_id == user_id;
        ResourceView {
            resource: self,
            is_owner,
        }
    }
}

impl<P: Serialize> Resource<P> {
    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl<P: DeserializeOwned> Resource<P> {
    pub fn from_bytes(data: &[u8]) -> anyhow::Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Caller-relative projection of a resource.
///
/// `is_owner` is derived at fetch time from the fetched resource, never
/// cached independently; it decides which write path the sync client uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceView<P> {
    #[serde(flatten)]
    pub resource: Resource<P>,
    pub is_owner: bool,
}

/// Sanitized projection served to anonymous public-token readers.
///
/// Never carries `ownerId`, `sharedWith`, or internal ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicResourceView<P> {
    pub name: String,
    pub kind: ResourceKind,
    pub payload: P,
    pub created_at: i64,
    pub updated_at: i64,
}

impl<P> PublicResourceView<P> {
    pub fn of(resource: Resource<P>) -> Self {
        Self {
            name: resource.name,
            kind: resource.kind,
            payload: resource.payload,
            created_at: resource.created_at,
            updated_at: resource.updated_at,
        }
    }
}

/// Allow-listed patch a collaborator may apply to a shared item.
///
/// Only `name` and `payload` exist here; a patch body attempting to smuggle
/// `sharedWith`, `ownerId` or public-sharing fields simply has them dropped
/// during deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}
