//! Stash Storage - Low-level storage abstraction layer
//!
//! This crate provides the persistence layer for Stash, using redb as the
//! embedded database. It exposes byte-level APIs to avoid circular
//! dependencies with the domain crate's models.
//!
//! # Architecture
//!
//! The storage layer uses a simple key-value design with separate tables for
//! different entity types, plus unique index tables that are maintained in
//! the same transaction as their primary table. Higher-level type wrappers
//! are provided by the stash-core crate.
//!
//! # Tables
//!
//! - `resources` - Shareable resource envelopes (clipboards, link
//!   collections, command entries)
//! - `resource_tokens` - Public share token -> resource id
//! - `users` - User profiles
//! - `usernames` - Username -> user id

pub mod resource;
pub mod user;

use anyhow::Result;
use redb::Database;
use std::sync::Arc;

pub use resource::ResourceStorage;
pub use user::UserStorage;

/// Central storage manager that initializes all storage subsystems
pub struct Storage {
    db: Arc<Database>,
    pub resources: ResourceStorage,
    pub users: UserStorage,
}

impl Storage {
    /// Create a new storage instance at the given path.
    ///
    /// This will create the database file if it doesn't exist and initialize
    /// all required tables.
    pub fn new(path: &str) -> Result<Self> {
        let db = Arc::new(Database::create(path)?);

        let resources = ResourceStorage::new(db.clone())?;
        let users = UserStorage::new(db.clone())?;

        Ok(Self {
            db,
            resources,
            users,
        })
    }

    /// Get a reference to the underlying database
    pub fn get_db(&self) -> Arc<Database> {
        self.db.clone()
    }
}
