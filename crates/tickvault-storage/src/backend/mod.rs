//! Ordered key-value store backends.
//!
//! The adapter talks to its engine only through [`OrderedStore`]: byte-string
//! keys in lexicographic order, range scans, and atomic write batches over a
//! fixed set of [`Namespace`]s.
//!
//! - [`RedbStore`]: durable, backed by [redb](https://crates.io/crates/redb)
//! - [`InMemoryStore`]: `BTreeMap` per namespace, for tests and development

mod memory;
mod redb;

use std::fmt;
use std::ops::Bound;

pub use self::memory::InMemoryStore;
pub use self::redb::RedbStore;

use crate::error::StorageResult;

/// Logical sub-namespace of the store. Each one is an independent key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Bar records.
    Bar,
    /// Tick records.
    Tick,
    /// Bar partition overviews.
    BarOverview,
    /// Tick partition overviews.
    TickOverview,
}

impl Namespace {
    /// All namespaces.
    pub const ALL: [Namespace; 4] = [
        Namespace::Bar,
        Namespace::Tick,
        Namespace::BarOverview,
        Namespace::TickOverview,
    ];

    /// Stable name, used as the table name by durable backends.
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Bar => "bar",
            Namespace::Tick => "tick",
            Namespace::BarOverview => "bar_overview",
            Namespace::TickOverview => "tick_overview",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A range of keys with inclusive, exclusive or open bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    /// Lower bound.
    pub start: Bound<Vec<u8>>,
    /// Upper bound.
    pub end: Bound<Vec<u8>>,
}

impl KeyRange {
    /// Every key of the namespace.
    pub fn all() -> Self {
        Self {
            start: Bound::Unbounded,
            end: Bound::Unbounded,
        }
    }

    /// A range no key falls in.
    pub fn empty() -> Self {
        Self {
            start: Bound::Excluded(Vec::new()),
            end: Bound::Excluded(Vec::new()),
        }
    }

    /// Keys in `[start, end]`.
    pub fn inclusive(start: Vec<u8>, end: Vec<u8>) -> Self {
        Self {
            start: Bound::Included(start),
            end: Bound::Included(end),
        }
    }

    /// Every key starting with `prefix`.
    pub fn prefix(prefix: &[u8]) -> Self {
        Self {
            start: Bound::Included(prefix.to_vec()),
            end: match prefix_successor(prefix) {
                Some(next) => Bound::Excluded(next),
                None => Bound::Unbounded,
            },
        }
    }

    /// True when no key can fall in the range.
    ///
    /// Backends check this first: `BTreeMap::range` panics on inverted bounds.
    pub fn is_empty(&self) -> bool {
        match (&self.start, &self.end) {
            (Bound::Included(a), Bound::Included(b)) => a > b,
            (Bound::Included(a), Bound::Excluded(b))
            | (Bound::Excluded(a), Bound::Included(b))
            | (Bound::Excluded(a), Bound::Excluded(b)) => a >= b,
            _ => false,
        }
    }

    /// True when `key` falls in the range.
    pub fn contains(&self, key: &[u8]) -> bool {
        let above = match &self.start {
            Bound::Included(s) => key >= s.as_slice(),
            Bound::Excluded(s) => key > s.as_slice(),
            Bound::Unbounded => true,
        };
        let below = match &self.end {
            Bound::Included(e) => key <= e.as_slice(),
            Bound::Excluded(e) => key < e.as_slice(),
            Bound::Unbounded => true,
        };
        above && below
    }

    pub(crate) fn as_slices(&self) -> (Bound<&[u8]>, Bound<&[u8]>) {
        (borrow_bound(&self.start), borrow_bound(&self.end))
    }
}

fn borrow_bound(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(v) => Bound::Included(v.as_slice()),
        Bound::Excluded(v) => Bound::Excluded(v.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// Smallest key greater than every key starting with `prefix`, if one exists.
fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut next = prefix.to_vec();
    while let Some(last) = next.pop() {
        if last < u8::MAX {
            next.push(last + 1);
            return Some(next);
        }
    }
    None
}

/// One mutation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Insert or replace a value.
    Put {
        /// Target namespace.
        namespace: Namespace,
        /// Key.
        key: Vec<u8>,
        /// Value.
        value: Vec<u8>,
    },
    /// Remove a key if present.
    Delete {
        /// Target namespace.
        namespace: Namespace,
        /// Key.
        key: Vec<u8>,
    },
}

/// An ordered list of mutations applied atomically by [`OrderedStore::write`].
///
/// Later operations on the same key win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a put.
    pub fn put(&mut self, namespace: Namespace, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(BatchOp::Put {
            namespace,
            key,
            value,
        });
    }

    /// Queues a delete.
    pub fn delete(&mut self, namespace: Namespace, key: Vec<u8>) {
        self.ops.push(BatchOp::Delete { namespace, key });
    }

    /// Number of queued operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Queued operations in order.
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }
}

/// A key/value pair returned by a scan.
pub type Entry = (Vec<u8>, Vec<u8>);

/// Ordered key-value store.
///
/// Implementations must apply a [`WriteBatch`] atomically: after `write`
/// returns `Ok`, every operation is visible; after it returns `Err`, none is.
/// Scans return entries in ascending key order.
pub trait OrderedStore: Send + Sync {
    /// Returns the backend name for logging.
    fn backend_name(&self) -> &'static str;

    /// Checks if the store is accessible.
    fn is_healthy(&self) -> bool;

    /// Reads one value.
    fn get(&self, namespace: Namespace, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Reads every entry in `range`, ascending.
    fn scan(&self, namespace: Namespace, range: &KeyRange) -> StorageResult<Vec<Entry>>;

    /// Reads every key in `range`, ascending, without values.
    fn scan_keys(&self, namespace: Namespace, range: &KeyRange) -> StorageResult<Vec<Vec<u8>>> {
        Ok(self
            .scan(namespace, range)?
            .into_iter()
            .map(|(key, _)| key)
            .collect())
    }

    /// Applies a batch atomically.
    fn write(&self, batch: WriteBatch) -> StorageResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_range() {
        let range = KeyRange::prefix(b"SSE|600036|");
        assert!(range.contains(b"SSE|600036|2024-01-02 09:30:00.000000"));
        assert!(range.contains(b"SSE|600036|"));
        assert!(!range.contains(b"SSE|600037|2024-01-02 09:30:00.000000"));
        assert!(!range.contains(b"SSE|60003"));
        assert_eq!(range.end, Bound::Excluded(b"SSE|600036}".to_vec()));
    }

    #[test]
    fn test_prefix_successor_carries() {
        assert_eq!(prefix_successor(b"a\xff"), Some(b"b".to_vec()));
        assert_eq!(prefix_successor(b"\xff\xff"), None);
        assert_eq!(KeyRange::prefix(b"\xff").end, Bound::Unbounded);
    }

    #[test]
    fn test_empty_ranges() {
        assert!(KeyRange::inclusive(b"b".to_vec(), b"a".to_vec()).is_empty());
        assert!(!KeyRange::inclusive(b"a".to_vec(), b"a".to_vec()).is_empty());
        assert!(!KeyRange::all().is_empty());
        assert!(KeyRange::empty().is_empty());
        assert!(!KeyRange::empty().contains(b""));
        assert!(KeyRange {
            start: Bound::Excluded(b"a".to_vec()),
            end: Bound::Excluded(b"a".to_vec()),
        }
        .is_empty());
    }

    #[test]
    fn test_write_batch_keeps_order() {
        let mut batch = WriteBatch::new();
        assert!(batch.is_empty());
        batch.put(Namespace::Bar, b"k".to_vec(), b"v1".to_vec());
        batch.delete(Namespace::Bar, b"k".to_vec());
        assert_eq!(batch.len(), 2);
        assert!(matches!(batch.ops()[1], BatchOp::Delete { .. }));
    }
}
