//! Key-value database adapter.
//!
//! [`KvDatabase`] implements [`BaseDatabase`] on top of any [`OrderedStore`].
//! Each save, delete and overview rebuild is one atomic store batch, run
//! under the lock of the partition it touches.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, FixedOffset, SubsecRound};
use tracing::{debug, info};

use tickvault_core::{
    BarData, BarOverview, Exchange, Interval, StorageTimeZone, TickData, TickOverview,
};

use crate::adapter::BaseDatabase;
use crate::backend::{InMemoryStore, KeyRange, OrderedStore, RedbStore, WriteBatch};
use crate::config::{BackendKind, DatabaseConfig};
use crate::error::{StorageError, StorageResult};
use crate::keys::{
    decode_timestamp, split_key, time_range, timestamp_key, BarPartition, TickPartition,
};
use crate::overview::{merged_span, plan_update, OverviewUpdate, PartitionLocks, PartitionSpan};
use crate::series::{Bars, Series, Ticks};

/// Keys are stored with microsecond resolution.
const SUBSEC_DIGITS: u16 = 6;

/// Market data database over an ordered key-value store.
///
/// Owns its store handle for its whole lifetime. Share it between threads
/// through an `Arc`.
pub struct KvDatabase<S: OrderedStore> {
    store: S,
    tz: StorageTimeZone,
    locks: PartitionLocks,
}

impl<S: OrderedStore> KvDatabase<S> {
    /// Creates a database over `store`, storing timestamps in `tz`.
    pub fn new(store: S, tz: StorageTimeZone) -> Self {
        Self {
            store,
            tz,
            locks: PartitionLocks::new(),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The zone timestamps are stored in.
    pub fn time_zone(&self) -> StorageTimeZone {
        self.tz
    }

    /// Converts a timestamp to the stored representation.
    fn storage_time(&self, datetime: &DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        self.tz.normalize(datetime).trunc_subsecs(SUBSEC_DIGITS)
    }

    fn save<T: Series>(&self, records: &[T::Record], append_hint: bool) -> StorageResult<()> {
        let (first, rest) = records
            .split_first()
            .ok_or(StorageError::EmptyBatch { record: T::LABEL })?;
        let partition = T::partition_of(first);
        for record in rest {
            let found = T::partition_of(record);
            if found != partition {
                return Err(StorageError::MixedPartition {
                    expected: partition.to_string(),
                    found: found.to_string(),
                });
            }
        }

        let prefix = T::prefix(&partition)?;

        // Later records for the same key replace earlier ones.
        let mut entries: BTreeMap<Vec<u8>, (DateTime<FixedOffset>, Vec<u8>)> = BTreeMap::new();
        for record in records {
            let datetime = self.storage_time(T::datetime(record));
            let key = timestamp_key(&prefix, &datetime)?;
            entries.insert(key, (datetime, T::encode(record)?));
        }
        let batch_span = match (entries.values().next(), entries.values().next_back()) {
            (Some((start, _)), Some((end, _))) => PartitionSpan {
                count: entries.len() as u64,
                start: *start,
                end: *end,
            },
            _ => return Err(StorageError::EmptyBatch { record: T::LABEL }),
        };

        self.locks.with_partition(&prefix, || -> StorageResult<()> {
            let current = self
                .store
                .get(T::OVERVIEWS, &prefix)?
                .map(|bytes| T::decode_overview(&bytes))
                .transpose()?
                .map(|overview| T::span(&overview));

            let span = match plan_update(current.as_ref(), &batch_span, append_hint, &partition) {
                OverviewUpdate::Ready(span) => span,
                OverviewUpdate::Rescan => {
                    let existing = self.store.scan_keys(T::RECORDS, &KeyRange::prefix(&prefix))?;
                    merged_span(&existing, entries.keys(), prefix.len(), &self.tz)?
                }
            };

            let saved = entries.len();
            let mut batch = WriteBatch::new();
            for (key, (_, value)) in entries {
                batch.put(T::RECORDS, key, value);
            }
            let overview = T::overview(&partition, &span);
            batch.put(T::OVERVIEWS, prefix.clone(), T::encode_overview(&overview)?);
            self.store.write(batch)?;

            debug!(
                record = T::LABEL,
                %partition,
                saved,
                count = span.count,
                append_hint,
                "saved batch"
            );
            Ok(())
        })
    }

    fn load<T: Series>(
        &self,
        partition: &T::Partition,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> StorageResult<Vec<T::Record>> {
        let prefix = T::prefix(partition)?;
        let start = self.tz.normalize(&start);
        let end = self.tz.normalize(&end);
        if start > end {
            return Ok(Vec::new());
        }

        let range = time_range(&prefix, &start, &end);
        let records = self
            .store
            .scan(T::RECORDS, &range)?
            .into_iter()
            .map(|(key, value)| {
                let datetime = decode_timestamp(&key, prefix.len(), &self.tz)?;
                T::decode(&value, partition, datetime)
            })
            .collect::<StorageResult<Vec<_>>>()?;

        debug!(record = T::LABEL, %partition, loaded = records.len(), "loaded range");
        Ok(records)
    }

    fn delete<T: Series>(&self, partition: &T::Partition) -> StorageResult<usize> {
        let prefix = T::prefix(partition)?;
        let result = self.locks.with_partition(&prefix, || -> StorageResult<usize> {
            let keys = self.store.scan_keys(T::RECORDS, &KeyRange::prefix(&prefix))?;
            let deleted = keys.len();

            let mut batch = WriteBatch::new();
            for key in keys {
                batch.delete(T::RECORDS, key);
            }
            batch.delete(T::OVERVIEWS, prefix.clone());
            self.store.write(batch)?;

            debug!(record = T::LABEL, %partition, deleted, "deleted partition");
            Ok(deleted)
        });
        self.locks.release(&prefix);
        result
    }

    fn list<T: Series>(&self) -> StorageResult<Vec<T::Overview>> {
        self.store
            .scan(T::OVERVIEWS, &KeyRange::all())?
            .iter()
            .map(|(_, value)| T::decode_overview(value))
            .collect()
    }

    fn rebuild<T: Series>(&self) -> StorageResult<usize> {
        let mut prefixes = BTreeSet::new();
        for key in self.store.scan_keys(T::RECORDS, &KeyRange::all())? {
            let (prefix, _) = split_key(&key)
                .ok_or_else(|| StorageError::decode("key", "no partition prefix"))?;
            prefixes.insert(prefix.to_vec());
        }
        let with_records = prefixes.len();
        prefixes.extend(self.store.scan_keys(T::OVERVIEWS, &KeyRange::all())?);

        for prefix in &prefixes {
            self.locks.with_partition(prefix, || -> StorageResult<()> {
                let keys = self.store.scan_keys(T::RECORDS, &KeyRange::prefix(prefix))?;
                let span = PartitionSpan::from_keys(
                    keys.iter().map(Vec::as_slice),
                    prefix.len(),
                    &self.tz,
                )?;

                let mut batch = WriteBatch::new();
                match span {
                    Some(span) => {
                        let partition = T::parse_prefix(prefix)?;
                        let overview = T::overview(&partition, &span);
                        batch.put(T::OVERVIEWS, prefix.clone(), T::encode_overview(&overview)?);
                    }
                    None => batch.delete(T::OVERVIEWS, prefix.clone()),
                }
                self.store.write(batch)
            })?;
        }

        info!(
            record = T::LABEL,
            partitions = with_records,
            orphans = prefixes.len() - with_records,
            "rebuilt overviews"
        );
        Ok(with_records)
    }
}

impl KvDatabase<RedbStore> {
    /// Opens the redb file named by `config`.
    ///
    /// The configured backend is not consulted; use [`create_database`] to
    /// honour it.
    pub fn open(config: &DatabaseConfig) -> StorageResult<Self> {
        let tz = config.storage_time_zone()?;
        Ok(Self::new(RedbStore::open(&config.path)?, tz))
    }
}

impl KvDatabase<InMemoryStore> {
    /// Creates an empty in-memory database.
    pub fn in_memory(tz: StorageTimeZone) -> Self {
        Self::new(InMemoryStore::new(), tz)
    }
}

/// Creates a database with the backend chosen by `config`.
pub fn create_database(config: &DatabaseConfig) -> StorageResult<Box<dyn BaseDatabase>> {
    let tz = config.storage_time_zone()?;
    let db: Box<dyn BaseDatabase> = match config.backend {
        BackendKind::Redb => Box::new(KvDatabase::open(config)?),
        BackendKind::Memory => Box::new(KvDatabase::in_memory(tz)),
    };
    info!(backend = %config.backend, timezone = %tz, "created database");
    Ok(db)
}

impl<S: OrderedStore> BaseDatabase for KvDatabase<S> {
    fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    fn is_healthy(&self) -> bool {
        self.store.is_healthy()
    }

    fn save_bars(&self, bars: &[BarData], append_hint: bool) -> StorageResult<()> {
        self.save::<Bars>(bars, append_hint)
    }

    fn load_bars(
        &self,
        symbol: &str,
        exchange: &Exchange,
        interval: Interval,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> StorageResult<Vec<BarData>> {
        let partition = BarPartition::new(exchange.clone(), symbol, interval);
        self.load::<Bars>(&partition, start, end)
    }

    fn delete_bars(
        &self,
        symbol: &str,
        exchange: &Exchange,
        interval: Interval,
    ) -> StorageResult<usize> {
        self.delete::<Bars>(&BarPartition::new(exchange.clone(), symbol, interval))
    }

    fn list_bar_overviews(&self) -> StorageResult<Vec<BarOverview>> {
        self.list::<Bars>()
    }

    fn rebuild_bar_overviews(&self) -> StorageResult<usize> {
        self.rebuild::<Bars>()
    }

    fn save_ticks(&self, ticks: &[TickData], append_hint: bool) -> StorageResult<()> {
        self.save::<Ticks>(ticks, append_hint)
    }

    fn load_ticks(
        &self,
        symbol: &str,
        exchange: &Exchange,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> StorageResult<Vec<TickData>> {
        let partition = TickPartition::new(exchange.clone(), symbol);
        self.load::<Ticks>(&partition, start, end)
    }

    fn delete_ticks(&self, symbol: &str, exchange: &Exchange) -> StorageResult<usize> {
        self.delete::<Ticks>(&TickPartition::new(exchange.clone(), symbol))
    }

    fn list_tick_overviews(&self) -> StorageResult<Vec<TickOverview>> {
        self.list::<Ticks>()
    }

    fn rebuild_tick_overviews(&self) -> StorageResult<usize> {
        self.rebuild::<Ticks>()
    }
}
