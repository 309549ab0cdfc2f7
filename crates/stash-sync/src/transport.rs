//! Transport abstraction between the sync client and the server.
//!
//! The client never talks HTTP directly; it goes through this trait so
//! tests can substitute an in-memory transport.

use crate::error::Result;
use async_trait::async_trait;
use stash_core::{Resource, ResourceView, ShareOutcome, ShareRequest, SharedItemPatch};

#[async_trait]
pub trait SyncTransport<P>: Send + Sync {
    /// Fetch every resource visible to the current user.
    async fn fetch_resources(&self) -> Result<Vec<ResourceView<P>>>;

    /// Replace the user's full owned set; returns the canonical set with
    /// server-assigned ids and tokens, in submission order.
    async fn save_owned(&self, resources: Vec<Resource<P>>) -> Result<Vec<Resource<P>>>;

    /// Patch a single item shared with the current user.
    async fn save_shared_item(&self, id: &str, patch: SharedItemPatch) -> Result<Resource<P>>;

    /// Execute a sharing action (grant, revoke, leave, public toggle).
    async fn share(&self, request: ShareRequest) -> Result<ShareOutcome>;
}
