//! Domain types for market time-series storage.
//!
//! - [`Exchange`]: Venue identifier
//! - [`Interval`]: Bar aggregation period
//! - [`BarData`]: One OHLC bar
//! - [`TickData`]: One level-5 quote snapshot
//! - [`BarOverview`] / [`TickOverview`]: Per-partition summaries
//! - [`StorageTimeZone`]: Canonical zone for stored timestamps

mod bar;
mod exchange;
mod interval;
mod overview;
mod tick;
mod timezone;

pub use bar::BarData;
pub use exchange::Exchange;
pub use interval::Interval;
pub use overview::{BarOverview, TickOverview};
pub use tick::{TickData, DEPTH};
pub use timezone::StorageTimeZone;
