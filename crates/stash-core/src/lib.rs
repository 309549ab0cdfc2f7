//! Stash Core - domain logic for the personal data store.
//!
//! The heart of this crate is the resource sharing protocol: a generic
//! access-control ledger over owned resources (clipboards, link
//! collections, command entries) with three access tiers - private,
//! collaborative, and anonymous public access through unguessable tokens.

pub mod error;
pub mod gateway;
pub mod ledger;
pub mod models;
pub mod paths;
pub mod resources;
pub mod token;
pub mod users;
pub mod viewer;

pub use error::ShareError;
pub use models::*;

use std::sync::Arc;
use stash_storage::Storage;
use tracing::info;

/// Core application state shared between the server and tests
pub struct AppCore {
    pub storage: Arc<Storage>,
}

impl AppCore {
    pub async fn new(db_path: &str) -> anyhow::Result<Self> {
        let storage = Arc::new(Storage::new(db_path)?);

        info!("Initializing Stash core");

        Ok(Self { storage })
    }
}
