//! User storage - byte-level API for user profiles with a unique username
//! index.

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

/// Users table: user id -> JSON profile
const USERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
/// Index: username -> user id
const USERNAME_INDEX_TABLE: TableDefinition<&str, &str> = TableDefinition::new("usernames");

/// Low-level user storage
#[derive(Clone)]
pub struct UserStorage {
    db: Arc<Database>,
}

impl UserStorage {
    /// Create a new UserStorage, initializing all tables.
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(USERS_TABLE)?;
        write_txn.open_table(USERNAME_INDEX_TABLE)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Store a user profile, indexing it by username. Fails if the username
    /// is already taken by another user.
    pub fn put(&self, id: &str, username: &str, data: &[u8]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut index = write_txn.open_table(USERNAME_INDEX_TABLE)?;
            if let Some(existing) = index.get(username)?
                && existing.value() != id
            {
                anyhow::bail!("Username {} already taken", username);
            }
            index.insert(username, id)?;
            let mut table = write_txn.open_table(USERS_TABLE)?;
            table.insert(id, data)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a user profile by id.
    pub fn get(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS_TABLE)?;
        Ok(table.get(id)?.map(|v| v.value().to_vec()))
    }

    /// Resolve a username to a user id.
    pub fn resolve_username(&self, username: &str) -> Result<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USERNAME_INDEX_TABLE)?;
        Ok(index.get(username)?.map(|v| v.value().to_string()))
    }

    /// List all user profiles as (id, data) pairs.
    pub fn list(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS_TABLE)?;
        let mut items = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            items.push((key.value().to_string(), value.value().to_vec()));
        }
        Ok(items)
    }
}
