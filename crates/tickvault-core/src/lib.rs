//! # Tickvault Core
//!
//! Core market data types shared by the tickvault storage layer.
//!
//! This crate provides the record shapes a trading framework hands to its
//! database adapter:
//!
//! - **Identifiers**: [`Exchange`] and [`Interval`]
//! - **Records**: [`BarData`] (OHLC bars) and [`TickData`] (level-5 quotes)
//! - **Summaries**: [`BarOverview`] and [`TickOverview`]
//! - **Time zones**: [`StorageTimeZone`], the canonical zone records are stored in
//!
//! ## Example
//!
//! ```rust
//! use chrono::{FixedOffset, TimeZone};
//! use tickvault_core::prelude::*;
//!
//! let tz = FixedOffset::east_opt(8 * 3600).unwrap();
//! let bar = BarData::new(
//!     "BTCUSDT",
//!     Exchange::new("BINANCE"),
//!     Interval::Minute,
//!     tz.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
//! );
//! assert_eq!(bar.vt_symbol(), "BTCUSDT.BINANCE");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod error;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use types::{
    BarData, BarOverview, Exchange, Interval, StorageTimeZone, TickData, TickOverview, DEPTH,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::types::{
        BarData, BarOverview, Exchange, Interval, StorageTimeZone, TickData, TickOverview,
    };
}
