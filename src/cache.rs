use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StorageError;
use crate::object::{Related, SharedObject};
use crate::record::Record;
use crate::value::Value;

/// The three process-lifetime caches behind the storage, as one explicit
/// object constructed by the host and shared by reference. No eviction:
/// entries persist until the cache itself is dropped, so a long-lived host
/// decides the lifetime by deciding when to build a fresh one.
///
/// - snapshots: `(table, pk)` → last record read from or written to the
///   database, used only to compute the changed-column set on save;
/// - objects: `(type, pk)` → the one live instance for that row;
/// - relations: `(class, join column, join value)` → loaded relation result,
///   shared across owners whose keys match exactly.
#[derive(Default)]
pub struct StorageCache {
    snapshots: RwLock<HashMap<String, Record>>,
    objects: RwLock<HashMap<String, SharedObject>>,
    relations: RwLock<HashMap<String, Related>>,
}

impl StorageCache {
    pub fn new() -> Self {
        StorageCache::default()
    }

    pub fn snapshot_key(table: &str, pk: &Value) -> String {
        format!("{}_{}", table, pk.key_string())
    }

    pub fn object_key(type_name: &str, pk: &Value) -> String {
        format!("{}_{}", type_name, pk.key_string())
    }

    pub fn relation_key(class: &str, column: &str, value: &Value) -> String {
        format!("{}_{}_{}", class, column, value.key_string())
    }

    pub fn lookup_snapshot(&self, table: &str, pk: &Value) -> Result<Option<Record>, StorageError> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| StorageError::LockPoisoned("snapshot read"))?;
        Ok(snapshots.get(&Self::snapshot_key(table, pk)).cloned())
    }

    pub fn insert_snapshot(
        &self,
        table: &str,
        pk: &Value,
        record: Record,
    ) -> Result<(), StorageError> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| StorageError::LockPoisoned("snapshot write"))?;
        snapshots.insert(Self::snapshot_key(table, pk), record);
        Ok(())
    }

    pub fn lookup_object(
        &self,
        type_name: &str,
        pk: &Value,
    ) -> Result<Option<SharedObject>, StorageError> {
        let objects = self
            .objects
            .read()
            .map_err(|_| StorageError::LockPoisoned("object read"))?;
        Ok(objects.get(&Self::object_key(type_name, pk)).cloned())
    }

    pub fn insert_object(
        &self,
        type_name: &str,
        pk: &Value,
        object: SharedObject,
    ) -> Result<(), StorageError> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| StorageError::LockPoisoned("object write"))?;
        objects.insert(Self::object_key(type_name, pk), object);
        Ok(())
    }

    pub fn lookup_relation(&self, key: &str) -> Result<Option<Related>, StorageError> {
        let relations = self
            .relations
            .read()
            .map_err(|_| StorageError::LockPoisoned("relation read"))?;
        Ok(relations.get(key).cloned())
    }

    pub fn insert_relation(&self, key: String, related: Related) -> Result<(), StorageError> {
        let mut relations = self
            .relations
            .write()
            .map_err(|_| StorageError::LockPoisoned("relation write"))?;
        relations.insert(key, related);
        Ok(())
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn object_count(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn relation_count(&self) -> usize {
        self.relations.read().map(|r| r.len()).unwrap_or(0)
    }
}
