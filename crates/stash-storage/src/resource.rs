//! Resource storage - byte-level API for shareable resource envelopes and
//! the public token index.
//!
//! The token index maps a public share token to a resource id. It is
//! maintained in the same transaction as the resource record, so a token
//! never resolves to a resource that does not carry it.

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

/// Resources table: resource id -> JSON envelope
const RESOURCES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("resources");
/// Index: public token -> resource id
const TOKEN_INDEX_TABLE: TableDefinition<&str, &str> = TableDefinition::new("resource_tokens");

/// Low-level resource storage with a public token index
#[derive(Clone)]
pub struct ResourceStorage {
    db: Arc<Database>,
}

impl ResourceStorage {
    /// Create a new ResourceStorage, initializing all tables.
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(RESOURCES_TABLE)?;
        write_txn.open_table(TOKEN_INDEX_TABLE)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Store a resource record by id.
    pub fn put(&self, id: &str, data: &[u8]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(RESOURCES_TABLE)?;
            table.insert(id, data)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Store a resource record and bind a public token to it in the same
    /// transaction. Fails if the token is already bound to another resource.
    pub fn put_and_bind_token(&self, id: &str, data: &[u8], token: &str) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut index = write_txn.open_table(TOKEN_INDEX_TABLE)?;
            if let Some(existing) = index.get(token)?
                && existing.value() != id
            {
                anyhow::bail!("Token already bound to another resource");
            }
            index.insert(token, id)?;
            let mut table = write_txn.open_table(RESOURCES_TABLE)?;
            table.insert(id, data)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Store a resource record and release its public token in the same
    /// transaction. The token never resolves again afterwards.
    pub fn put_and_release_token(&self, id: &str, data: &[u8], token: &str) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut index = write_txn.open_table(TOKEN_INDEX_TABLE)?;
            index.remove(token)?;
            let mut table = write_txn.open_table(RESOURCES_TABLE)?;
            table.insert(id, data)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a resource record by id.
    pub fn get(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESOURCES_TABLE)?;
        Ok(table.get(id)?.map(|v| v.value().to_vec()))
    }

    /// Check if a resource exists.
    pub fn exists(&self, id: &str) -> Result<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESOURCES_TABLE)?;
        Ok(table.get(id)?.is_some())
    }

    /// List all resource records as (id, data) pairs.
    pub fn list(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESOURCES_TABLE)?;
        let mut items = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            items.push((key.value().to_string(), value.value().to_vec()));
        }
        Ok(items)
    }

    /// Remove a resource, releasing its public token if one is given.
    /// Returns true if the resource existed.
    pub fn remove(&self, id: &str, token: Option<&str>) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(RESOURCES_TABLE)?;
            let was_present = table.remove(id)?.is_some();
            if let Some(token) = token {
                let mut index = write_txn.open_table(TOKEN_INDEX_TABLE)?;
                index.remove(token)?;
            }
            was_present
        };
        write_txn.commit()?;
        Ok(existed)
    }

    /// Resolve a public token to a resource id.
    pub fn resolve_token(&self, token: &str) -> Result<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(TOKEN_INDEX_TABLE)?;
        Ok(index.get(token)?.map(|v| v.value().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn create_test_storage() -> ResourceStorage {
        let tmp = NamedTempFile::new().unwrap();
        let db = Arc::new(Database::create(tmp.path()).unwrap());
        ResourceStorage::new(db).unwrap()
    }

    #[test]
    fn test_put_and_get() {
        let storage = create_test_storage();
        let data = serde_json::to_vec(&json!({
            "id": "res-1",
            "ownerId": "user-1",
            "name": "Scratch"
        }))
        .unwrap();

        storage.put("res-1", &data).unwrap();
        assert!(storage.exists("res-1").unwrap());

        let fetched = storage.get("res-1").unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&fetched).unwrap();
        assert_eq!(parsed["name"], "Scratch");

        assert!(storage.get("res-2").unwrap().is_none());
    }

    #[test]
    fn test_bind_and_resolve_token() {
        let storage = create_test_storage();
        let data = serde_json::to_vec(&json!({ "id": "res-1" })).unwrap();

        storage
            .put_and_bind_token("res-1", &data, "deadbeefdeadbeefdeadbeefdeadbeef")
            .unwrap();

        let resolved = storage
            .resolve_token("deadbeefdeadbeefdeadbeefdeadbeef")
            .unwrap();
        assert_eq!(resolved, Some("res-1".to_string()));
    }

    #[test]
    fn test_token_collision_rejected() {
        let storage = create_test_storage();
        let data = serde_json::to_vec(&json!({ "id": "x" })).unwrap();

        storage.put_and_bind_token("res-1", &data, "tok").unwrap();
        // Re-binding the same token to the same resource is an upsert
        storage.put_and_bind_token("res-1", &data, "tok").unwrap();
        // Binding it to another resource is not
        assert!(storage.put_and_bind_token("res-2", &data, "tok").is_err());
    }

    #[test]
    fn test_release_token() {
        let storage = create_test_storage();
        let data = serde_json::to_vec(&json!({ "id": "res-1" })).unwrap();

        storage.put_and_bind_token("res-1", &data, "tok").unwrap();
        storage.put_and_release_token("res-1", &data, "tok").unwrap();

        assert!(storage.resolve_token("tok").unwrap().is_none());
        // Resource record remains
        assert!(storage.exists("res-1").unwrap());
    }

    #[test]
    fn test_remove_releases_token() {
        let storage = create_test_storage();
        let data = serde_json::to_vec(&json!({ "id": "res-1" })).unwrap();

        storage.put_and_bind_token("res-1", &data, "tok").unwrap();
        assert!(storage.remove("res-1", Some("tok")).unwrap());

        assert!(!storage.exists("res-1").unwrap());
        assert!(storage.resolve_token("tok").unwrap().is_none());
        assert!(!storage.remove("res-1", None).unwrap());
    }

    #[test]
    fn test_list() {
        let storage = create_test_storage();
        for id in &["a", "b", "c"] {
            let data = serde_json::to_vec(&json!({ "id": id })).unwrap();
            storage.put(id, &data).unwrap();
        }
        assert_eq!(storage.list().unwrap().len(), 3);
    }
}
