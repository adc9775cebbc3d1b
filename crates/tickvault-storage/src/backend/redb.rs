//! Redb-backed ordered store.
//!
//! Each [`Namespace`] is one redb table keyed by raw bytes. redb compares
//! `&[u8]` keys lexicographically, which is the order the key codec relies on.

use std::path::Path;
use std::sync::Arc;

use ::redb::{Database, ReadableTableMetadata, TableDefinition};
use tracing::info;

use super::{BatchOp, Entry, KeyRange, Namespace, OrderedStore, WriteBatch};
use crate::error::StorageResult;

// Table definitions
const BAR_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("bar");
const TICK_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("tick");
const BAR_OVERVIEW_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("bar_overview");
const TICK_OVERVIEW_TABLE: TableDefinition<&[u8], &[u8]> =
    TableDefinition::new("tick_overview");

fn table_for(namespace: Namespace) -> TableDefinition<'static, &'static [u8], &'static [u8]> {
    match namespace {
        Namespace::Bar => BAR_TABLE,
        Namespace::Tick => TICK_TABLE,
        Namespace::BarOverview => BAR_OVERVIEW_TABLE,
        Namespace::TickOverview => TICK_OVERVIEW_TABLE,
    }
}

/// Redb-based ordered store.
///
/// Durable, ACID, single-writer. A [`WriteBatch`] maps to one write
/// transaction.
///
/// # Example
///
/// ```rust,no_run
/// use tickvault_storage::{OrderedStore, RedbStore};
///
/// let store = RedbStore::open("./data/tickvault.redb")?;
/// assert!(store.is_healthy());
/// # Ok::<(), tickvault_storage::StorageError>(())
/// ```
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Opens or creates a database at the given path.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;
        let store = Self { db: Arc::new(db) };
        store.initialize_tables()?;
        info!(path = %path.display(), "opened redb store");
        Ok(store)
    }

    /// Number of keys in a namespace.
    pub fn len(&self, namespace: Namespace) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table_for(namespace))?;
        Ok(table.len()?)
    }

    /// Creates every namespace table so read transactions never meet a
    /// missing table.
    fn initialize_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        for namespace in Namespace::ALL {
            let _ = write_txn.open_table(table_for(namespace))?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

impl OrderedStore for RedbStore {
    fn backend_name(&self) -> &'static str {
        "redb"
    }

    fn is_healthy(&self) -> bool {
        self.db.begin_read().is_ok()
    }

    fn get(&self, namespace: Namespace, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table_for(namespace))?;
        let value = table.get(key)?.map(|data| data.value().to_vec());
        Ok(value)
    }

    fn scan(&self, namespace: Namespace, range: &KeyRange) -> StorageResult<Vec<Entry>> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table_for(namespace))?;

        let mut entries = Vec::new();
        for entry in table.range::<&[u8]>(range.as_slices())? {
            let (key, value) = entry?;
            entries.push((key.value().to_vec(), value.value().to_vec()));
        }
        Ok(entries)
    }

    fn scan_keys(&self, namespace: Namespace, range: &KeyRange) -> StorageResult<Vec<Vec<u8>>> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table_for(namespace))?;

        let mut keys = Vec::new();
        for entry in table.range::<&[u8]>(range.as_slices())? {
            let (key, _) = entry?;
            keys.push(key.value().to_vec());
        }
        Ok(keys)
    }

    fn write(&self, batch: WriteBatch) -> StorageResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let write_txn = self.db.begin_write()?;
        {
            for op in batch.ops() {
                match op {
                    BatchOp::Put {
                        namespace,
                        key,
                        value,
                    } => {
                        let mut table = write_txn.open_table(table_for(*namespace))?;
                        table.insert(key.as_slice(), value.as_slice())?;
                    }
                    BatchOp::Delete { namespace, key } => {
                        let mut table = write_txn.open_table(table_for(*namespace))?;
                        table.remove(key.as_slice())?;
                    }
                }
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_backend_name() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();
        assert_eq!(store.backend_name(), "redb");
        assert!(store.is_healthy());
    }

    #[test]
    fn test_write_and_scan() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();

        let mut batch = WriteBatch::new();
        batch.put(Namespace::Bar, b"1m|X|A|1".to_vec(), b"one".to_vec());
        batch.put(Namespace::Bar, b"1m|X|A|2".to_vec(), b"two".to_vec());
        batch.put(Namespace::Bar, b"1m|X|B|1".to_vec(), b"other".to_vec());
        batch.put(Namespace::BarOverview, b"1m|X|A|".to_vec(), b"ov".to_vec());
        store.write(batch).unwrap();

        let entries = store.scan(Namespace::Bar, &KeyRange::prefix(b"1m|X|A|")).unwrap();
        assert_eq!(
            entries,
            vec![
                (b"1m|X|A|1".to_vec(), b"one".to_vec()),
                (b"1m|X|A|2".to_vec(), b"two".to_vec()),
            ]
        );
        assert_eq!(store.len(Namespace::Bar).unwrap(), 3);
        assert_eq!(store.len(Namespace::BarOverview).unwrap(), 1);
        assert_eq!(
            store.get(Namespace::BarOverview, b"1m|X|A|").unwrap(),
            Some(b"ov".to_vec())
        );
    }

    #[test]
    fn test_delete_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("test.redb");

        {
            let store = RedbStore::open(&path).unwrap();
            let mut batch = WriteBatch::new();
            batch.put(Namespace::Tick, b"k1".to_vec(), b"v1".to_vec());
            batch.put(Namespace::Tick, b"k2".to_vec(), b"v2".to_vec());
            store.write(batch).unwrap();

            let mut batch = WriteBatch::new();
            batch.delete(Namespace::Tick, b"k1".to_vec());
            store.write(batch).unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.scan_keys(Namespace::Tick, &KeyRange::all()).unwrap(), vec![b"k2".to_vec()]);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("test.redb")).unwrap();
        let range = KeyRange::inclusive(b"b".to_vec(), b"a".to_vec());
        assert!(store.scan(Namespace::Tick, &range).unwrap().is_empty());
    }
}
