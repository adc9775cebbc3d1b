//! Per-partition summary records.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::{Exchange, Interval};

/// Summary of the bars stored for one `(exchange, symbol, interval)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarOverview {
    /// Instrument symbol.
    pub symbol: String,
    /// Exchange the symbol trades on.
    pub exchange: Exchange,
    /// Aggregation period.
    pub interval: Interval,
    /// Number of stored bars.
    pub count: u64,
    /// Earliest stored bar time.
    pub start: DateTime<FixedOffset>,
    /// Latest stored bar time.
    pub end: DateTime<FixedOffset>,
}

/// Summary of the ticks stored for one `(exchange, symbol)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickOverview {
    /// Instrument symbol.
    pub symbol: String,
    /// Exchange the symbol trades on.
    pub exchange: Exchange,
    /// Number of stored ticks.
    pub count: u64,
    /// Earliest stored tick time.
    pub start: DateTime<FixedOffset>,
    /// Latest stored tick time.
    pub end: DateTime<FixedOffset>,
}

impl BarOverview {
    /// Returns `symbol.exchange`.
    pub fn vt_symbol(&self) -> String {
        format!("{}.{}", self.symbol, self.exchange)
    }
}

impl TickOverview {
    /// Returns `symbol.exchange`.
    pub fn vt_symbol(&self) -> String {
        format!("{}.{}", self.symbol, self.exchange)
    }
}
