//! In-memory ordered store.
//!
//! Keeps one `BTreeMap` per namespace. Useful for testing and development.
//! Data is not persisted across restarts.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use super::{BatchOp, Entry, KeyRange, Namespace, OrderedStore, WriteBatch};
use crate::error::{StorageError, StorageResult};

type Tables = HashMap<Namespace, BTreeMap<Vec<u8>, Vec<u8>>>;

/// In-memory ordered store.
///
/// A whole batch is applied under one write lock, so readers never see
/// part of a batch.
///
/// # Example
///
/// ```rust
/// use tickvault_storage::{InMemoryStore, OrderedStore};
///
/// let store = InMemoryStore::new();
/// assert!(store.is_healthy());
/// ```
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        let tables: Tables = Namespace::ALL
            .into_iter()
            .map(|namespace| (namespace, BTreeMap::new()))
            .collect();
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Number of keys in a namespace.
    pub fn len(&self, namespace: Namespace) -> StorageResult<usize> {
        let tables = self.read()?;
        Ok(tables.get(&namespace).map_or(0, BTreeMap::len))
    }

    /// Removes every key from every namespace.
    pub fn clear(&self) -> StorageResult<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| StorageError::StoreUnavailable(format!("Lock error: {}", e)))?;
        tables.values_mut().for_each(BTreeMap::clear);
        Ok(())
    }

    fn read(&self) -> StorageResult<std::sync::RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| StorageError::StoreUnavailable(format!("Lock error: {}", e)))
    }
}

impl OrderedStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn is_healthy(&self) -> bool {
        self.tables.read().is_ok()
    }

    fn get(&self, namespace: Namespace, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let tables = self.read()?;
        Ok(tables.get(&namespace).and_then(|t| t.get(key)).cloned())
    }

    fn scan(&self, namespace: Namespace, range: &KeyRange) -> StorageResult<Vec<Entry>> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let tables = self.read()?;
        let Some(table) = tables.get(&namespace) else {
            return Ok(Vec::new());
        };
        Ok(table
            .range::<[u8], _>(range.as_slices())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn scan_keys(&self, namespace: Namespace, range: &KeyRange) -> StorageResult<Vec<Vec<u8>>> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let tables = self.read()?;
        let Some(table) = tables.get(&namespace) else {
            return Ok(Vec::new());
        };
        Ok(table
            .range::<[u8], _>(range.as_slices())
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn write(&self, batch: WriteBatch) -> StorageResult<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| StorageError::StoreUnavailable(format!("Lock error: {}", e)))?;

        for op in batch.ops {
            match op {
                BatchOp::Put {
                    namespace,
                    key,
                    value,
                } => {
                    tables.entry(namespace).or_default().insert(key, value);
                }
                BatchOp::Delete { namespace, key } => {
                    if let Some(table) = tables.get_mut(&namespace) {
                        table.remove(&key);
                    }
                }
            }
        }
        Ok(())
    }
}
