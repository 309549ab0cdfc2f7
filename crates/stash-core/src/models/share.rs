//! Wire types for sharing actions.

use serde::{Deserialize, Serialize};

/// What a share request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareActionKind {
    /// Grant a collaborator (owner only)
    Add,
    /// Revoke a collaborator (owner only)
    Remove,
    /// Remove the requester's own grant
    Leave,
    /// Flip anonymous public access (owner only)
    PublicToggle,
}

/// A sharing request against one resource or a whole collection.
///
/// Exactly one of `resource_id` / `collection` is expected; `username` is
/// required for `add` and `remove`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    pub action: ShareActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl ShareRequest {
    pub fn add(resource_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            resource_id: Some(resource_id.into()),
            collection: None,
            action: ShareActionKind::Add,
            username: Some(username.into()),
        }
    }

    pub fn remove(resource_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            resource_id: Some(resource_id.into()),
            collection: None,
            action: ShareActionKind::Remove,
            username: Some(username.into()),
        }
    }

    pub fn leave(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: Some(resource_id.into()),
            collection: None,
            action: ShareActionKind::Leave,
            username: None,
        }
    }

    pub fn public_toggle(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: Some(resource_id.into()),
            collection: None,
            action: ShareActionKind::PublicToggle,
            username: None,
        }
    }

    pub fn add_collection(collection: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            resource_id: None,
            collection: Some(collection.into()),
            action: ShareActionKind::Add,
            username: Some(username.into()),
        }
    }
}

/// Result of a sharing action
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareOutcome {
    /// Present after a public toggle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_token: Option<String>,
    /// Number of resources granted by a collection-level request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granted: Option<usize>,
}
