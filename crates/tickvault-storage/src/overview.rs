//! Overview tracker.
//!
//! Every partition carries a summary record (count, start, end) stored under
//! the partition prefix. The tracker decides how a save updates it and owns
//! the per-partition locks that serialize the read-modify-write.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::warn;

use tickvault_core::StorageTimeZone;

use crate::error::{StorageError, StorageResult};
use crate::keys::decode_timestamp;

/// Record count and time span of a partition, or of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionSpan {
    /// Number of distinct keys.
    pub count: u64,
    /// Earliest datetime.
    pub start: DateTime<FixedOffset>,
    /// Latest datetime.
    pub end: DateTime<FixedOffset>,
}

impl PartitionSpan {
    /// Span of a sorted, de-duplicated set of full keys sharing one prefix.
    ///
    /// Returns `None` for an empty set.
    pub fn from_keys<'a, I>(
        keys: I,
        prefix_len: usize,
        tz: &StorageTimeZone,
    ) -> StorageResult<Option<Self>>
    where
        I: IntoIterator<Item = &'a [u8]>,
        I::IntoIter: DoubleEndedIterator + ExactSizeIterator,
    {
        let mut keys = keys.into_iter();
        let count = keys.len() as u64;
        let (Some(first), last) = (keys.next(), keys.next_back()) else {
            return Ok(None);
        };
        let start = decode_timestamp(first, prefix_len, tz)?;
        let end = match last {
            Some(last) => decode_timestamp(last, prefix_len, tz)?,
            None => start,
        };
        Ok(Some(Self { count, start, end }))
    }
}

/// What a save must do to the partition overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverviewUpdate {
    /// The new overview is known without reading the partition.
    Ready(PartitionSpan),
    /// The partition keys must be scanned and merged with the batch.
    Rescan,
}

/// Decides how a batch changes the overview of its partition.
///
/// - No overview yet: the batch alone defines it.
/// - Append hint and the batch starts strictly after the current end: the
///   counts add up.
/// - Otherwise the partition is rescanned. A contradicted append hint is
///   logged.
pub fn plan_update(
    current: Option<&PartitionSpan>,
    batch: &PartitionSpan,
    append_hint: bool,
    partition: &dyn fmt::Display,
) -> OverviewUpdate {
    let Some(current) = current else {
        return OverviewUpdate::Ready(*batch);
    };
    if !append_hint {
        return OverviewUpdate::Rescan;
    }
    if batch.start > current.end {
        return OverviewUpdate::Ready(PartitionSpan {
            count: current.count + batch.count,
            start: current.start.min(batch.start),
            end: batch.end.max(current.end),
        });
    }
    warn!(
        %partition,
        batch_start = %batch.start,
        overview_end = %current.end,
        "append hint contradicted by data, rescanning partition"
    );
    OverviewUpdate::Rescan
}

/// Span of the union of existing partition keys and batch keys.
pub fn merged_span(
    existing: &[Vec<u8>],
    batch: impl IntoIterator<Item = impl AsRef<[u8]>>,
    prefix_len: usize,
    tz: &StorageTimeZone,
) -> StorageResult<PartitionSpan> {
    let batch: Vec<_> = batch.into_iter().collect();
    let keys: BTreeSet<&[u8]> = existing
        .iter()
        .map(Vec::as_slice)
        .chain(batch.iter().map(AsRef::as_ref))
        .collect();
    PartitionSpan::from_keys(keys, prefix_len, tz)?
        .ok_or_else(|| StorageError::decode("overview", "merged partition has no keys"))
}

/// Per-partition mutual exclusion, keyed by partition prefix.
///
/// Locks are created on first use and live as long as the registry.
#[derive(Debug, Default)]
pub struct PartitionLocks {
    locks: DashMap<Vec<u8>, Arc<Mutex<()>>>,
}

impl PartitionLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock of `prefix`.
    pub fn with_partition<T>(&self, prefix: &[u8], f: impl FnOnce() -> T) -> T {
        // The map shard guard is released before blocking on the mutex.
        let lock = self.locks.entry(prefix.to_vec()).or_default().value().clone();
        let _guard = lock.lock();
        f()
    }

    /// Drops the lock of `prefix` unless another caller holds or awaits it.
    ///
    /// Called once a partition is deleted so the registry only tracks live
    /// partitions.
    pub fn release(&self, prefix: &[u8]) {
        self.locks.remove_if(prefix, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Number of partitions currently registered.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// True when no partition is registered.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
