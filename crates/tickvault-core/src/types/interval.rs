//! Bar interval (granularity).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Aggregation period of a bar.
///
/// The text form returned by [`Interval::as_str`] is part of the on-disk key
/// layout and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Interval {
    /// One-minute bars.
    #[serde(rename = "1m")]
    Minute,
    /// One-hour bars.
    #[serde(rename = "1h")]
    Hour,
    /// Daily bars.
    #[serde(rename = "d")]
    Daily,
    /// Weekly bars.
    #[serde(rename = "w")]
    Weekly,
    /// Tick-built bars.
    #[serde(rename = "tick")]
    Tick,
}

impl Interval {
    /// All intervals, in declaration order.
    pub const ALL: [Interval; 5] = [
        Interval::Minute,
        Interval::Hour,
        Interval::Daily,
        Interval::Weekly,
        Interval::Tick,
    ];

    /// Returns the stable text code of the interval.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Minute => "1m",
            Interval::Hour => "1h",
            Interval::Daily => "d",
            Interval::Weekly => "w",
            Interval::Tick => "tick",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .into_iter()
            .find(|interval| interval.as_str() == s)
            .ok_or_else(|| CoreError::invalid_interval(s))
    }
}
