//! Bar and tick series.
//!
//! Bars and ticks are stored the same way: a partition prefix, timestamped
//! keys, a payload per record and one overview per partition. [`Series`]
//! captures the differences so the database code is written once.

use std::fmt;

use chrono::{DateTime, FixedOffset};

use tickvault_core::{BarData, BarOverview, TickData, TickOverview};

use crate::backend::Namespace;
use crate::codec;
use crate::error::StorageResult;
use crate::keys::{self, BarPartition, TickPartition};
use crate::overview::PartitionSpan;

/// One kind of time series stored by the database.
pub trait Series {
    /// Stored record.
    type Record;
    /// Partition identity.
    type Partition: Clone + PartialEq + fmt::Display;
    /// Per-partition summary.
    type Overview;

    /// Record kind used in errors and logs.
    const LABEL: &'static str;
    /// Namespace holding the records.
    const RECORDS: Namespace;
    /// Namespace holding the overviews.
    const OVERVIEWS: Namespace;

    /// Partition a record belongs to.
    fn partition_of(record: &Self::Record) -> Self::Partition;

    /// Encoded partition prefix.
    fn prefix(partition: &Self::Partition) -> StorageResult<Vec<u8>>;

    /// Inverse of [`Series::prefix`].
    fn parse_prefix(prefix: &[u8]) -> StorageResult<Self::Partition>;

    /// Record timestamp as supplied by the caller.
    fn datetime(record: &Self::Record) -> &DateTime<FixedOffset>;

    /// Encodes the payload of a record.
    fn encode(record: &Self::Record) -> StorageResult<Vec<u8>>;

    /// Rebuilds a record from its payload and key.
    fn decode(
        bytes: &[u8],
        partition: &Self::Partition,
        datetime: DateTime<FixedOffset>,
    ) -> StorageResult<Self::Record>;

    /// Builds the overview of a partition.
    fn overview(partition: &Self::Partition, span: &PartitionSpan) -> Self::Overview;

    /// Count and span held by an overview.
    fn span(overview: &Self::Overview) -> PartitionSpan;

    /// Encodes an overview.
    fn encode_overview(overview: &Self::Overview) -> StorageResult<Vec<u8>>;

    /// Decodes an overview.
    fn decode_overview(bytes: &[u8]) -> StorageResult<Self::Overview>;
}

/// OHLC bars, partitioned by `(interval, exchange, symbol)`.
#[derive(Debug, Clone, Copy)]
pub struct Bars;

/// Tick quotes, partitioned by `(exchange, symbol)`.
#[derive(Debug, Clone, Copy)]
pub struct Ticks;

impl Series for Bars {
    type Record = BarData;
    type Partition = BarPartition;
    type Overview = BarOverview;

    const LABEL: &'static str = "bar";
    const RECORDS: Namespace = Namespace::Bar;
    const OVERVIEWS: Namespace = Namespace::BarOverview;

    fn partition_of(record: &BarData) -> BarPartition {
        BarPartition::of(record)
    }

    fn prefix(partition: &BarPartition) -> StorageResult<Vec<u8>> {
        partition.prefix()
    }

    fn parse_prefix(prefix: &[u8]) -> StorageResult<BarPartition> {
        keys::parse_bar_prefix(prefix)
    }

    fn datetime(record: &BarData) -> &DateTime<FixedOffset> {
        &record.datetime
    }

    fn encode(record: &BarData) -> StorageResult<Vec<u8>> {
        codec::encode_bar(record)
    }

    fn decode(
        bytes: &[u8],
        partition: &BarPartition,
        datetime: DateTime<FixedOffset>,
    ) -> StorageResult<BarData> {
        codec::decode_bar(bytes, partition, datetime)
    }

    fn overview(partition: &BarPartition, span: &PartitionSpan) -> BarOverview {
        BarOverview {
            symbol: partition.symbol.clone(),
            exchange: partition.exchange.clone(),
            interval: partition.interval,
            count: span.count,
            start: span.start,
            end: span.end,
        }
    }

    fn span(overview: &BarOverview) -> PartitionSpan {
        PartitionSpan {
            count: overview.count,
            start: overview.start,
            end: overview.end,
        }
    }

    fn encode_overview(overview: &BarOverview) -> StorageResult<Vec<u8>> {
        codec::encode_bar_overview(overview)
    }

    fn decode_overview(bytes: &[u8]) -> StorageResult<BarOverview> {
        codec::decode_bar_overview(bytes)
    }
}

impl Series for Ticks {
    type Record = TickData;
    type Partition = TickPartition;
    type Overview = TickOverview;

    const LABEL: &'static str = "tick";
    const RECORDS: Namespace = Namespace::Tick;
    const OVERVIEWS: Namespace = Namespace::TickOverview;

    fn partition_of(record: &TickData) -> TickPartition {
        TickPartition::of(record)
    }

    fn prefix(partition: &TickPartition) -> StorageResult<Vec<u8>> {
        partition.prefix()
    }

    fn parse_prefix(prefix: &[u8]) -> StorageResult<TickPartition> {
        keys::parse_tick_prefix(prefix)
    }

    fn datetime(record: &TickData) -> &DateTime<FixedOffset> {
        &record.datetime
    }

    fn encode(record: &TickData) -> StorageResult<Vec<u8>> {
        codec::encode_tick(record)
    }

    fn decode(
        bytes: &[u8],
        partition: &TickPartition,
        datetime: DateTime<FixedOffset>,
    ) -> StorageResult<TickData> {
        codec::decode_tick(bytes, partition, datetime)
    }

    fn overview(partition: &TickPartition, span: &PartitionSpan) -> TickOverview {
        TickOverview {
            symbol: partition.symbol.clone(),
            exchange: partition.exchange.clone(),
            count: span.count,
            start: span.start,
            end: span.end,
        }
    }

    fn span(overview: &TickOverview) -> PartitionSpan {
        PartitionSpan {
            count: overview.count,
            start: overview.start,
            end: overview.end,
        }
    }

    fn encode_overview(overview: &TickOverview) -> StorageResult<Vec<u8>> {
        codec::encode_tick_overview(overview)
    }

    fn decode_overview(bytes: &[u8]) -> StorageResult<TickOverview> {
        codec::decode_tick_overview(bytes)
    }
}
