//! Canonical storage time zone.

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// The zone every stored timestamp is converted to before it is encoded.
///
/// Keys hold wall-clock text, so all records of a database must share one
/// zone for the text to sort chronologically. A fixed offset is used because
/// wall-clock text in a zone with daylight saving would not be monotonic.
///
/// # Example
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use tickvault_core::StorageTimeZone;
///
/// let tz: StorageTimeZone = "+08:00".parse().unwrap();
/// let utc = Utc.with_ymd_and_hms(2024, 1, 2, 1, 0, 0).unwrap();
/// assert_eq!(tz.normalize(&utc).to_rfc3339(), "2024-01-02T09:00:00+08:00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StorageTimeZone(FixedOffset);

impl StorageTimeZone {
    /// UTC, the default storage zone.
    #[must_use]
    pub fn utc() -> Self {
        Self(Utc.fix())
    }

    /// Wraps a fixed offset.
    #[must_use]
    pub fn new(offset: FixedOffset) -> Self {
        Self(offset)
    }

    /// Returns the underlying offset.
    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.0
    }

    /// Converts a timestamp from any zone into the storage zone.
    ///
    /// The instant is unchanged; only its wall-clock representation moves.
    pub fn normalize<Tz: TimeZone>(&self, datetime: &DateTime<Tz>) -> DateTime<FixedOffset> {
        datetime.with_timezone(&self.0)
    }
}

impl Default for StorageTimeZone {
    fn default() -> Self {
        Self::utc()
    }
}

impl fmt::Display for StorageTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.0.local_minus_utc();
        if seconds == 0 {
            return f.write_str("UTC");
        }
        let sign = if seconds < 0 { '-' } else { '+' };
        let minutes = seconds.abs() / 60;
        write!(f, "{sign}{:02}:{:02}", minutes / 60, minutes % 60)
    }
}

impl FromStr for StorageTimeZone {
    type Err = CoreError;

    /// Accepts `UTC`, `Z`, `+HH:MM`, `-HH:MM`, `+HHMM` and `+HH`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.eq_ignore_ascii_case("utc") || text == "Z" {
            return Ok(Self::utc());
        }

        let (sign, digits) = match text.as_bytes().first() {
            Some(b'+') => (1, &text[1..]),
            Some(b'-') => (-1, &text[1..]),
            _ => return Err(CoreError::invalid_time_zone(s, "expected UTC or a +/- offset")),
        };

        let digits: String = digits.chars().filter(|c| *c != ':').collect();
        if !digits.chars().all(|c| c.is_ascii_digit()) || !(digits.len() == 2 || digits.len() == 4)
        {
            return Err(CoreError::invalid_time_zone(s, "offset must be HH, HHMM or HH:MM"));
        }

        let hours: i32 = digits[..2]
            .parse()
            .map_err(|_| CoreError::invalid_time_zone(s, "bad hour"))?;
        let minutes: i32 = if digits.len() == 4 {
            digits[2..]
                .parse()
                .map_err(|_| CoreError::invalid_time_zone(s, "bad minute"))?
        } else {
            0
        };
        if minutes >= 60 {
            return Err(CoreError::invalid_time_zone(s, "minutes out of range"));
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Self)
            .ok_or_else(|| CoreError::invalid_time_zone(s, "offset out of range"))
    }
}

impl TryFrom<String> for StorageTimeZone {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StorageTimeZone> for String {
    fn from(tz: StorageTimeZone) -> Self {
        tz.to_string()
    }
}

impl From<FixedOffset> for StorageTimeZone {
    fn from(offset: FixedOffset) -> Self {
        Self(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offsets() {
        assert_eq!("UTC".parse::<StorageTimeZone>().unwrap(), StorageTimeZone::utc());
        assert_eq!("Z".parse::<StorageTimeZone>().unwrap(), StorageTimeZone::utc());

        let tz: StorageTimeZone = "+08:00".parse().unwrap();
        assert_eq!(tz.offset().local_minus_utc(), 8 * 3600);

        let tz: StorageTimeZone = "-0530".parse().unwrap();
        assert_eq!(tz.offset().local_minus_utc(), -(5 * 3600 + 30 * 60));

        let tz: StorageTimeZone = "+09".parse().unwrap();
        assert_eq!(tz.offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("Asia/Shanghai".parse::<StorageTimeZone>().is_err());
        assert!("+8".parse::<StorageTimeZone>().is_err());
        assert!("+08:75".parse::<StorageTimeZone>().is_err());
        assert!("+25:00".parse::<StorageTimeZone>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["UTC", "+08:00", "-05:30"] {
            let tz: StorageTimeZone = text.parse().unwrap();
            assert_eq!(tz.to_string(), text);
        }
    }

    #[test]
    fn test_normalize_keeps_instant() {
        let tz: StorageTimeZone = "+08:00".parse().unwrap();
        let utc = Utc.with_ymd_and_hms(2024, 1, 2, 23, 30, 0).unwrap();
        let local = tz.normalize(&utc);

        assert_eq!(local, utc);
        assert_eq!(local.to_rfc3339(), "2024-01-03T07:30:00+08:00");
    }
}
