//! Level-5 tick record.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Exchange;

/// Number of order book levels carried by a tick.
pub const DEPTH: usize = 5;

/// One quote snapshot of a symbol: last trade, session statistics and five
/// levels of bid/ask.
///
/// A tick is identified by `(exchange, symbol, datetime)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickData {
    /// Instrument symbol.
    pub symbol: String,
    /// Exchange the symbol trades on.
    pub exchange: Exchange,
    /// Exchange timestamp.
    pub datetime: DateTime<FixedOffset>,

    /// Instrument display name.
    pub name: String,
    /// Cumulative session volume.
    pub volume: Decimal,
    /// Cumulative session turnover.
    pub turnover: Decimal,
    /// Open interest.
    pub open_interest: Decimal,
    /// Last traded price.
    pub last_price: Decimal,
    /// Last traded volume.
    pub last_volume: Decimal,
    /// Upper price limit.
    pub limit_up: Decimal,
    /// Lower price limit.
    pub limit_down: Decimal,

    /// Session open.
    pub open_price: Decimal,
    /// Session high.
    pub high_price: Decimal,
    /// Session low.
    pub low_price: Decimal,
    /// Previous session close.
    pub pre_close: Decimal,

    /// Bid prices, best first.
    pub bid_prices: [Decimal; DEPTH],
    /// Ask prices, best first.
    pub ask_prices: [Decimal; DEPTH],
    /// Bid volumes, aligned with `bid_prices`.
    pub bid_volumes: [Decimal; DEPTH],
    /// Ask volumes, aligned with `ask_prices`.
    pub ask_volumes: [Decimal; DEPTH],

    /// Local receive time, if the feed recorded one.
    pub localtime: Option<DateTime<FixedOffset>>,
}

impl TickData {
    /// Creates a tick with every price and volume set to zero.
    pub fn new(
        symbol: impl Into<String>,
        exchange: Exchange,
        datetime: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            exchange,
            datetime,
            name: String::new(),
            volume: Decimal::ZERO,
            turnover: Decimal::ZERO,
            open_interest: Decimal::ZERO,
            last_price: Decimal::ZERO,
            last_volume: Decimal::ZERO,
            limit_up: Decimal::ZERO,
            limit_down: Decimal::ZERO,
            open_price: Decimal::ZERO,
            high_price: Decimal::ZERO,
            low_price: Decimal::ZERO,
            pre_close: Decimal::ZERO,
            bid_prices: [Decimal::ZERO; DEPTH],
            ask_prices: [Decimal::ZERO; DEPTH],
            bid_volumes: [Decimal::ZERO; DEPTH],
            ask_volumes: [Decimal::ZERO; DEPTH],
            localtime: None,
        }
    }

    /// Sets the last trade.
    pub fn with_last(mut self, price: Decimal, volume: Decimal) -> Self {
        self.last_price = price;
        self.last_volume = volume;
        self
    }

    /// Sets one book level. `level` is zero-based; out-of-range levels are ignored.
    pub fn with_level(
        mut self,
        level: usize,
        bid: (Decimal, Decimal),
        ask: (Decimal, Decimal),
    ) -> Self {
        if level < DEPTH {
            self.bid_prices[level] = bid.0;
            self.bid_volumes[level] = bid.1;
            self.ask_prices[level] = ask.0;
            self.ask_volumes[level] = ask.1;
        }
        self
    }

    /// Returns `symbol.exchange`, the framework-wide instrument id.
    pub fn vt_symbol(&self) -> String {
        format!("{}.{}", self.symbol, self.exchange)
    }

    /// Mid of the best bid and ask, if both sides are quoted.
    pub fn mid_price(&self) -> Option<Decimal> {
        let bid = self.bid_prices[0];
        let ask = self.ask_prices[0];
        if bid.is_zero() || ask.is_zero() {
            return None;
        }
        Some((bid + ask) / Decimal::TWO)
    }
}
