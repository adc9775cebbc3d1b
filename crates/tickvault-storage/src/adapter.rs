//! Database adapter trait definition.
//!
//! This module defines the `BaseDatabase` trait a trading framework calls to
//! persist and query market data.

use chrono::{DateTime, FixedOffset};

use tickvault_core::{BarData, BarOverview, Exchange, Interval, TickData, TickOverview};

use crate::error::StorageResult;

/// Market data database.
///
/// Records are grouped into partitions: bars by `(exchange, symbol,
/// interval)`, ticks by `(exchange, symbol)`. Every partition has an
/// overview (count, start, end) that always matches its records.
///
/// # Example
///
/// ```rust
/// use chrono::{FixedOffset, TimeZone};
/// use rust_decimal_macros::dec;
/// use tickvault_core::{BarData, Exchange, Interval};
/// use tickvault_storage::{BaseDatabase, KvDatabase};
///
/// let db = KvDatabase::in_memory(Default::default());
/// let utc = FixedOffset::east_opt(0).unwrap();
/// let at = |m| utc.with_ymd_and_hms(2024, 1, 2, 9, m, 0).unwrap();
///
/// let bars: Vec<_> = (0..3)
///     .map(|m| {
///         BarData::new("BTCUSDT", Exchange::new("BINANCE"), Interval::Minute, at(m))
///             .with_prices(dec!(100), dec!(101), dec!(99), dec!(100))
///     })
///     .collect();
/// db.save_bars(&bars, false)?;
///
/// let loaded = db.load_bars("BTCUSDT", &Exchange::new("BINANCE"), Interval::Minute, at(0), at(1))?;
/// assert_eq!(loaded.len(), 2);
/// assert_eq!(db.list_bar_overviews()?[0].count, 3);
/// # Ok::<(), tickvault_storage::StorageError>(())
/// ```
pub trait BaseDatabase: Send + Sync {
    /// Returns the backend name for logging.
    fn backend_name(&self) -> &'static str;

    /// Checks if the underlying store is accessible.
    fn is_healthy(&self) -> bool;

    // =========================================================================
    // BAR OPERATIONS
    // =========================================================================

    /// Upserts a batch of bars from one partition.
    ///
    /// `append_hint` declares that every bar lies strictly after the
    /// partition's current end, which lets the overview be updated without
    /// a scan. A wrong hint costs a scan, never accuracy.
    fn save_bars(&self, bars: &[BarData], append_hint: bool) -> StorageResult<()>;

    /// Loads bars with `start <= datetime <= end`, ascending.
    fn load_bars(
        &self,
        symbol: &str,
        exchange: &Exchange,
        interval: Interval,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> StorageResult<Vec<BarData>>;

    /// Deletes every bar of a partition and its overview.
    ///
    /// Returns the number of bars removed.
    fn delete_bars(&self, symbol: &str, exchange: &Exchange, interval: Interval)
        -> StorageResult<usize>;

    /// Lists all bar overviews in key order.
    fn list_bar_overviews(&self) -> StorageResult<Vec<BarOverview>>;

    /// Recomputes every bar overview from the stored bars.
    ///
    /// Returns the number of partitions that have bars.
    fn rebuild_bar_overviews(&self) -> StorageResult<usize>;

    // =========================================================================
    // TICK OPERATIONS
    // =========================================================================

    /// Upserts a batch of ticks from one partition.
    fn save_ticks(&self, ticks: &[TickData], append_hint: bool) -> StorageResult<()>;

    /// Loads ticks with `start <= datetime <= end`, ascending.
    fn load_ticks(
        &self,
        symbol: &str,
        exchange: &Exchange,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> StorageResult<Vec<TickData>>;

    /// Deletes every tick of a partition and its overview.
    fn delete_ticks(&self, symbol: &str, exchange: &Exchange) -> StorageResult<usize>;

    /// Lists all tick overviews in key order.
    fn list_tick_overviews(&self) -> StorageResult<Vec<TickOverview>>;

    /// Recomputes every tick overview from the stored ticks.
    fn rebuild_tick_overviews(&self) -> StorageResult<usize>;

    // =========================================================================
    // MAINTENANCE OPERATIONS
    // =========================================================================

    /// Returns database statistics, read from the overviews.
    fn stats(&self) -> StorageResult<DatabaseStats> {
        let bars = self.list_bar_overviews()?;
        let ticks = self.list_tick_overviews()?;
        Ok(DatabaseStats {
            bar_partitions: bars.len(),
            bar_count: bars.iter().map(|o| o.count).sum(),
            tick_partitions: ticks.len(),
            tick_count: ticks.iter().map(|o| o.count).sum(),
        })
    }
}

/// Database statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Number of bar partitions.
    pub bar_partitions: usize,
    /// Number of stored bars.
    pub bar_count: u64,
    /// Number of tick partitions.
    pub tick_partitions: usize,
    /// Number of stored ticks.
    pub tick_count: u64,
}

impl DatabaseStats {
    /// Total number of stored records.
    pub fn total_records(&self) -> u64 {
        self.bar_count + self.tick_count
    }
}
