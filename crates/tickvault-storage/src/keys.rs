//! Key codec.
//!
//! Maps record identities to byte-string keys whose bytewise order matches
//! chronological order inside a partition.
//!
//! Layout (stable on disk):
//!
//! ```text
//! bar  key: {interval}|{exchange}|{symbol}|{timestamp}
//! tick key: {exchange}|{symbol}|{timestamp}
//! timestamp: YYYY-MM-DD HH:MM:SS.ffffff   (26 bytes, storage time zone)
//! ```
//!
//! The text before the timestamp is the partition prefix; it is also the
//! key of the partition's overview record. Key fields are validated instead
//! of escaped: a field can never contain the separator, so every prefix
//! splits back into exactly one identity.

use std::fmt;
use std::ops::Bound;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDateTime, SubsecRound, TimeZone, Timelike,
};

use tickvault_core::{BarData, Exchange, Interval, StorageTimeZone, TickData};

use crate::backend::KeyRange;
use crate::error::{StorageError, StorageResult};

/// Separator between key fields.
pub const SEPARATOR: u8 = b'|';

/// Timestamp text layout used in keys.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Length in bytes of the timestamp part of every key.
pub const TIMESTAMP_LEN: usize = 26;

const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Identity of a bar partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BarPartition {
    /// Exchange code.
    pub exchange: Exchange,
    /// Instrument symbol.
    pub symbol: String,
    /// Bar interval.
    pub interval: Interval,
}

impl BarPartition {
    /// Creates a bar partition identity.
    pub fn new(exchange: Exchange, symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            exchange,
            symbol: symbol.into(),
            interval,
        }
    }

    /// The partition a bar belongs to.
    pub fn of(bar: &BarData) -> Self {
        Self::new(bar.exchange.clone(), bar.symbol.clone(), bar.interval)
    }

    /// Encodes the partition prefix.
    pub fn prefix(&self) -> StorageResult<Vec<u8>> {
        bar_prefix(&self.exchange, &self.symbol, self.interval)
    }
}

impl fmt::Display for BarPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}@{}", self.symbol, self.exchange, self.interval)
    }
}

/// Identity of a tick partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TickPartition {
    /// Exchange code.
    pub exchange: Exchange,
    /// Instrument symbol.
    pub symbol: String,
}

impl TickPartition {
    /// Creates a tick partition identity.
    pub fn new(exchange: Exchange, symbol: impl Into<String>) -> Self {
        Self {
            exchange,
            symbol: symbol.into(),
        }
    }

    /// The partition a tick belongs to.
    pub fn of(tick: &TickData) -> Self {
        Self::new(tick.exchange.clone(), tick.symbol.clone())
    }

    /// Encodes the partition prefix.
    pub fn prefix(&self) -> StorageResult<Vec<u8>> {
        tick_prefix(&self.exchange, &self.symbol)
    }
}

impl fmt::Display for TickPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.symbol, self.exchange)
    }
}

/// Prefix shared by every bar key of `(interval, exchange, symbol)`.
pub fn bar_prefix(exchange: &Exchange, symbol: &str, interval: Interval) -> StorageResult<Vec<u8>> {
    join_fields(&[
        ("interval", interval.as_str()),
        ("exchange", exchange.as_str()),
        ("symbol", symbol),
    ])
}

/// Prefix shared by every tick key of `(exchange, symbol)`.
pub fn tick_prefix(exchange: &Exchange, symbol: &str) -> StorageResult<Vec<u8>> {
    join_fields(&[("exchange", exchange.as_str()), ("symbol", symbol)])
}

/// Full key of one bar. `datetime` must already be in the storage zone.
pub fn bar_key(
    exchange: &Exchange,
    symbol: &str,
    interval: Interval,
    datetime: &DateTime<FixedOffset>,
) -> StorageResult<Vec<u8>> {
    timestamp_key(&bar_prefix(exchange, symbol, interval)?, datetime)
}

/// Full key of one tick. `datetime` must already be in the storage zone.
pub fn tick_key(
    exchange: &Exchange,
    symbol: &str,
    datetime: &DateTime<FixedOffset>,
) -> StorageResult<Vec<u8>> {
    timestamp_key(&tick_prefix(exchange, symbol)?, datetime)
}

/// Appends the timestamp text of `datetime` to `prefix`.
pub fn timestamp_key(prefix: &[u8], datetime: &DateTime<FixedOffset>) -> StorageResult<Vec<u8>> {
    let text = encode_timestamp(datetime)?;
    let mut key = Vec::with_capacity(prefix.len() + TIMESTAMP_LEN);
    key.extend_from_slice(prefix);
    key.extend_from_slice(text.as_bytes());
    Ok(key)
}

/// Key range of a partition's records with `start <= datetime <= end`.
///
/// Both bounds must already be in the storage zone. Keys hold microseconds,
/// so `start` is rounded up and `end` rounded down to a whole microsecond.
/// Bounds beyond the encodable years clamp to the partition edges.
pub fn time_range(
    prefix: &[u8],
    start: &DateTime<FixedOffset>,
    end: &DateTime<FixedOffset>,
) -> KeyRange {
    let lower = match ceil_micros(start).map(|start| bound_text(prefix, &start)) {
        Some(Edge::Before) => Bound::Included(prefix.to_vec()),
        Some(Edge::Within(key)) => Bound::Included(key),
        Some(Edge::After) | None => return KeyRange::empty(),
    };
    let upper = match bound_text(prefix, &end.trunc_subsecs(6)) {
        Edge::Before => return KeyRange::empty(),
        Edge::Within(key) => Bound::Included(key),
        Edge::After => KeyRange::prefix(prefix).end,
    };
    KeyRange {
        start: lower,
        end: upper,
    }
}

/// Where a range bound falls relative to the encodable years.
enum Edge {
    Before,
    Within(Vec<u8>),
    After,
}

fn bound_text(prefix: &[u8], datetime: &DateTime<FixedOffset>) -> Edge {
    match datetime.year() {
        year if year < 0 => Edge::Before,
        year if year > 9999 => Edge::After,
        _ => {
            let mut key = prefix.to_vec();
            key.extend_from_slice(datetime.format(TIMESTAMP_FORMAT).to_string().as_bytes());
            Edge::Within(key)
        }
    }
}

/// Smallest whole microsecond at or after `datetime`; `None` past the
/// representable range.
fn ceil_micros(datetime: &DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    let truncated = datetime.trunc_subsecs(6);
    if truncated == *datetime {
        Some(truncated)
    } else {
        truncated.checked_add_signed(Duration::microseconds(1))
    }
}

/// Renders the fixed-width, sortable timestamp text of `datetime` in its
/// own offset.
pub fn encode_timestamp(datetime: &DateTime<FixedOffset>) -> StorageResult<String> {
    if !(0..=9999).contains(&datetime.year()) {
        return Err(StorageError::invalid_key_field(
            "datetime",
            datetime.to_rfc3339(),
            "year outside 0000-9999",
        ));
    }
    if datetime.nanosecond() >= 1_000_000_000 {
        return Err(StorageError::invalid_key_field(
            "datetime",
            datetime.to_rfc3339(),
            "leap seconds cannot be stored",
        ));
    }
    Ok(datetime.format(TIMESTAMP_FORMAT).to_string())
}

/// Recovers the timestamp of a key whose prefix is `prefix_len` bytes long.
pub fn decode_timestamp(
    key: &[u8],
    prefix_len: usize,
    tz: &StorageTimeZone,
) -> StorageResult<DateTime<FixedOffset>> {
    let raw = key
        .get(prefix_len..)
        .filter(|raw| raw.len() == TIMESTAMP_LEN)
        .ok_or_else(|| StorageError::decode("key", "timestamp has wrong length"))?;
    let text = std::str::from_utf8(raw)
        .map_err(|_| StorageError::decode("key", "timestamp is not UTF-8"))?;
    let naive = NaiveDateTime::parse_from_str(text, TIMESTAMP_PARSE_FORMAT)
        .map_err(|e| StorageError::decode("key", format!("timestamp '{text}': {e}")))?;
    tz.offset()
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| StorageError::decode("key", format!("timestamp '{text}' is ambiguous")))
}

/// Splits a full key into partition prefix and timestamp bytes.
pub fn split_key(key: &[u8]) -> Option<(&[u8], &[u8])> {
    let prefix_len = key.len().checked_sub(TIMESTAMP_LEN)?;
    match key[..prefix_len].last() {
        Some(&SEPARATOR) => Some(key.split_at(prefix_len)),
        _ => None,
    }
}

/// Parses a bar partition prefix back into its identity.
pub fn parse_bar_prefix(prefix: &[u8]) -> StorageResult<BarPartition> {
    match split_fields(prefix, "bar prefix")?.as_slice() {
        [interval, exchange, symbol] => Ok(BarPartition::new(
            Exchange::new(*exchange),
            *symbol,
            interval.parse::<Interval>()?,
        )),
        fields => Err(StorageError::decode(
            "bar prefix",
            format!("expected 3 fields, found {}", fields.len()),
        )),
    }
}

/// Parses a tick partition prefix back into its identity.
pub fn parse_tick_prefix(prefix: &[u8]) -> StorageResult<TickPartition> {
    match split_fields(prefix, "tick prefix")?.as_slice() {
        [exchange, symbol] => Ok(TickPartition::new(Exchange::new(*exchange), *symbol)),
        fields => Err(StorageError::decode(
            "tick prefix",
            format!("expected 2 fields, found {}", fields.len()),
        )),
    }
}

fn join_fields(fields: &[(&'static str, &str)]) -> StorageResult<Vec<u8>> {
    let mut prefix = Vec::with_capacity(fields.iter().map(|(_, v)| v.len() + 1).sum());
    for (name, value) in fields {
        validate_field(name, value)?;
        prefix.extend_from_slice(value.as_bytes());
        prefix.push(SEPARATOR);
    }
    Ok(prefix)
}

fn validate_field(name: &'static str, value: &str) -> StorageResult<()> {
    if value.is_empty() {
        return Err(StorageError::invalid_key_field(name, value, "must not be empty"));
    }
    if value.bytes().any(|b| b == SEPARATOR) {
        return Err(StorageError::invalid_key_field(
            name,
            value,
            "contains the '|' separator",
        ));
    }
    if value.chars().any(char::is_control) {
        return Err(StorageError::invalid_key_field(
            name,
            value,
            "contains a control character",
        ));
    }
    Ok(())
}

fn split_fields<'a>(prefix: &'a [u8], record: &'static str) -> StorageResult<Vec<&'a str>> {
    let text =
        std::str::from_utf8(prefix).map_err(|_| StorageError::decode(record, "not UTF-8"))?;
    let body = text
        .strip_suffix(SEPARATOR as char)
        .ok_or_else(|| StorageError::decode(record, "missing trailing separator"))?;
    Ok(body.split(SEPARATOR as char).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shanghai() -> StorageTimeZone {
        "+08:00".parse().unwrap()
    }

    fn at(h: u32, m: u32, s: u32, micros: u32) -> DateTime<FixedOffset> {
        shanghai()
            .offset()
            .with_ymd_and_hms(2024, 1, 2, h, m, s)
            .unwrap()
            + chrono::Duration::microseconds(i64::from(micros))
    }

    #[test]
    fn test_bar_key_layout() {
        let key = bar_key(&Exchange::new("BINANCE"), "BTCUSDT", Interval::Minute, &at(9, 0, 0, 0))
            .unwrap();
        assert_eq!(key, b"1m|BINANCE|BTCUSDT|2024-01-02 09:00:00.000000".to_vec());
    }

    #[test]
    fn test_tick_key_layout() {
        let key = tick_key(&Exchange::new("SSE"), "600036", &at(9, 30, 3, 500_000)).unwrap();
        assert_eq!(key, b"SSE|600036|2024-01-02 09:30:03.500000".to_vec());
    }

    #[test]
    fn test_keys_sort_chronologically() {
        let prefix = tick_prefix(&Exchange::new("SSE"), "600036").unwrap();
        let times = [
            at(9, 30, 0, 0),
            at(9, 30, 0, 1),
            at(9, 30, 0, 999_999),
            at(9, 30, 1, 0),
            at(10, 0, 0, 0),
        ];
        let keys: Vec<_> = times.iter().map(|t| timestamp_key(&prefix, t).unwrap()).collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_decode_timestamp_round_trip() {
        let prefix = bar_prefix(&Exchange::new("CFFEX"), "IF2401", Interval::Daily).unwrap();
        let when = at(15, 0, 0, 123_456);
        let key = timestamp_key(&prefix, &when).unwrap();

        let decoded = decode_timestamp(&key, prefix.len(), &shanghai()).unwrap();
        assert_eq!(decoded, when);
        assert_eq!(decoded.offset(), when.offset());
    }

    #[test]
    fn test_decode_timestamp_rejects_garbage() {
        let tz = shanghai();
        assert!(decode_timestamp(b"SSE|X|2024-01-02", 6, &tz).is_err());
        assert!(decode_timestamp(b"SSE|X|2024-13-02 09:00:00.000000", 6, &tz).is_err());
    }

    #[test]
    fn test_prefix_does_not_match_longer_symbol() {
        let short = tick_prefix(&Exchange::new("BINANCE"), "BTC").unwrap();
        let long = tick_key(&Exchange::new("BINANCE"), "BTCUSDT", &at(9, 0, 0, 0)).unwrap();
        assert!(!long.starts_with(&short));
    }

    #[test]
    fn test_invalid_fields_rejected() {
        let err = bar_prefix(&Exchange::new("BIN|ANCE"), "BTC", Interval::Minute).unwrap_err();
        assert!(matches!(err, StorageError::InvalidKeyField { field: "exchange", .. }));

        let err = tick_prefix(&Exchange::new("SSE"), "").unwrap_err();
        assert!(matches!(err, StorageError::InvalidKeyField { field: "symbol", .. }));

        let err = tick_prefix(&Exchange::new("SSE"), "60\n0036").unwrap_err();
        assert!(matches!(err, StorageError::InvalidKeyField { field: "symbol", .. }));
    }

    #[test]
    fn test_out_of_range_year_rejected() {
        let far = shanghai().offset().with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        assert!(encode_timestamp(&far).is_err());
    }

    #[test]
    fn test_prefix_round_trip() {
        let bar = BarPartition::new(Exchange::new("BINANCE"), "BTCUSDT", Interval::Hour);
        assert_eq!(parse_bar_prefix(&bar.prefix().unwrap()).unwrap(), bar);

        let tick = TickPartition::new(Exchange::new("NYSE"), "IBM");
        assert_eq!(parse_tick_prefix(&tick.prefix().unwrap()).unwrap(), tick);

        assert!(parse_bar_prefix(b"BINANCE|BTCUSDT|").is_err());
        assert!(parse_tick_prefix(b"NYSE|IBM").is_err());
    }

    #[test]
    fn test_time_range_rounds_inward() {
        let prefix = tick_prefix(&Exchange::new("NYSE"), "IBM").unwrap();
        let start = at(9, 30, 0, 0) + chrono::Duration::nanoseconds(500);
        let end = at(9, 30, 0, 2) + chrono::Duration::nanoseconds(900);
        let range = time_range(&prefix, &start, &end);

        assert!(!range.contains(&timestamp_key(&prefix, &at(9, 30, 0, 0)).unwrap()));
        assert!(range.contains(&timestamp_key(&prefix, &at(9, 30, 0, 1)).unwrap()));
        assert!(range.contains(&timestamp_key(&prefix, &at(9, 30, 0, 2)).unwrap()));
        assert!(!range.contains(&timestamp_key(&prefix, &at(9, 30, 0, 3)).unwrap()));

        // Both bounds inside one microsecond.
        let end = start + chrono::Duration::nanoseconds(100);
        assert!(time_range(&prefix, &start, &end).is_empty());
    }

    #[test]
    fn test_time_range_clamps_out_of_range_years() {
        let prefix = tick_prefix(&Exchange::new("NYSE"), "IBM").unwrap();
        let min = DateTime::<chrono::Utc>::MIN_UTC.fixed_offset();
        let max = DateTime::<chrono::Utc>::MAX_UTC.fixed_offset();

        let everything = time_range(&prefix, &min, &max);
        assert_eq!(everything, KeyRange::prefix(&prefix));

        let key = timestamp_key(&prefix, &at(9, 30, 0, 0)).unwrap();
        assert!(time_range(&prefix, &min, &at(9, 30, 0, 0)).contains(&key));
        assert!(time_range(&prefix, &at(9, 30, 0, 0), &max).contains(&key));

        assert!(time_range(&prefix, &max, &max).is_empty());
        assert!(time_range(&prefix, &min, &min).is_empty());
    }

    #[test]
    fn test_split_key() {
        let key = tick_key(&Exchange::new("NYSE"), "IBM", &at(9, 30, 0, 0)).unwrap();
        let (prefix, ts) = split_key(&key).unwrap();
        assert_eq!(prefix, b"NYSE|IBM|");
        assert_eq!(ts.len(), TIMESTAMP_LEN);
        assert!(split_key(b"short").is_none());
    }
}
