//! OHLC bar record.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Exchange, Interval};

/// One OHLC bar of a symbol on an exchange.
///
/// A bar is identified by `(exchange, symbol, interval, datetime)`; saving a
/// second bar with the same identity replaces the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarData {
    /// Instrument symbol.
    pub symbol: String,
    /// Exchange the symbol trades on.
    pub exchange: Exchange,
    /// Aggregation period.
    pub interval: Interval,
    /// Bar open time.
    pub datetime: DateTime<FixedOffset>,
    /// Traded volume.
    pub volume: Decimal,
    /// Traded notional.
    pub turnover: Decimal,
    /// Open interest at bar close.
    pub open_interest: Decimal,
    /// Open price.
    pub open_price: Decimal,
    /// High price.
    pub high_price: Decimal,
    /// Low price.
    pub low_price: Decimal,
    /// Close price.
    pub close_price: Decimal,
}

impl BarData {
    /// Creates a bar with all prices and volumes set to zero.
    pub fn new(
        symbol: impl Into<String>,
        exchange: Exchange,
        interval: Interval,
        datetime: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            exchange,
            interval,
            datetime,
            volume: Decimal::ZERO,
            turnover: Decimal::ZERO,
            open_interest: Decimal::ZERO,
            open_price: Decimal::ZERO,
            high_price: Decimal::ZERO,
            low_price: Decimal::ZERO,
            close_price: Decimal::ZERO,
        }
    }

    /// Sets open, high, low and close.
    pub fn with_prices(mut self, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Self {
        self.open_price = open;
        self.high_price = high;
        self.low_price = low;
        self.close_price = close;
        self
    }

    /// Sets volume and turnover.
    pub fn with_volume(mut self, volume: Decimal, turnover: Decimal) -> Self {
        self.volume = volume;
        self.turnover = turnover;
        self
    }

    /// Sets open interest.
    pub fn with_open_interest(mut self, open_interest: Decimal) -> Self {
        self.open_interest = open_interest;
        self
    }

    /// Returns `symbol.exchange`, the framework-wide instrument id.
    pub fn vt_symbol(&self) -> String {
        format!("{}.{}", self.symbol, self.exchange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bar_builder() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let bar = BarData::new(
            "IF2401",
            Exchange::new("CFFEX"),
            Interval::Minute,
            tz.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap(),
        )
        .with_prices(dec!(3400), dec!(3410.2), dec!(3395), dec!(3408.6))
        .with_volume(dec!(120), dec!(1227096))
        .with_open_interest(dec!(150000));

        assert_eq!(bar.vt_symbol(), "IF2401.CFFEX");
        assert_eq!(bar.high_price, dec!(3410.2));
        assert_eq!(bar.turnover, dec!(1227096));
        assert_eq!(bar.open_interest, dec!(150000));
    }
}
