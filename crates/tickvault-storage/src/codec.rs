//! Record codec.
//!
//! Every stored value is a versioned envelope: one schema-version byte
//! followed by a JSON body. Bar and tick bodies omit the identity fields
//! (exchange, symbol, interval, datetime); those live in the key and are
//! re-injected on decode. Overview values store the full record.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use tickvault_core::{BarData, BarOverview, TickData, TickOverview, DEPTH};

use crate::error::{StorageError, StorageResult};
use crate::keys::{BarPartition, TickPartition};

/// Version byte written in front of every payload.
pub const SCHEMA_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct BarBody {
    volume: Decimal,
    turnover: Decimal,
    open_interest: Decimal,
    open_price: Decimal,
    high_price: Decimal,
    low_price: Decimal,
    close_price: Decimal,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TickBody {
    name: String,
    volume: Decimal,
    turnover: Decimal,
    open_interest: Decimal,
    last_price: Decimal,
    last_volume: Decimal,
    limit_up: Decimal,
    limit_down: Decimal,
    open_price: Decimal,
    high_price: Decimal,
    low_price: Decimal,
    pre_close: Decimal,
    bid_prices: [Decimal; DEPTH],
    ask_prices: [Decimal; DEPTH],
    bid_volumes: [Decimal; DEPTH],
    ask_volumes: [Decimal; DEPTH],
    localtime: Option<DateTime<FixedOffset>>,
}

/// Encodes the non-key fields of a bar.
pub fn encode_bar(bar: &BarData) -> StorageResult<Vec<u8>> {
    seal(&BarBody {
        volume: bar.volume,
        turnover: bar.turnover,
        open_interest: bar.open_interest,
        open_price: bar.open_price,
        high_price: bar.high_price,
        low_price: bar.low_price,
        close_price: bar.close_price,
    })
}

/// Decodes a bar payload, taking identity from the key.
pub fn decode_bar(
    bytes: &[u8],
    partition: &BarPartition,
    datetime: DateTime<FixedOffset>,
) -> StorageResult<BarData> {
    let body: BarBody = open("bar", bytes)?;
    Ok(BarData {
        symbol: partition.symbol.clone(),
        exchange: partition.exchange.clone(),
        interval: partition.interval,
        datetime,
        volume: body.volume,
        turnover: body.turnover,
        open_interest: body.open_interest,
        open_price: body.open_price,
        high_price: body.high_price,
        low_price: body.low_price,
        close_price: body.close_price,
    })
}

/// Encodes the non-key fields of a tick.
pub fn encode_tick(tick: &TickData) -> StorageResult<Vec<u8>> {
    seal(&TickBody {
        name: tick.name.clone(),
        volume: tick.volume,
        turnover: tick.turnover,
        open_interest: tick.open_interest,
        last_price: tick.last_price,
        last_volume: tick.last_volume,
        limit_up: tick.limit_up,
        limit_down: tick.limit_down,
        open_price: tick.open_price,
        high_price: tick.high_price,
        low_price: tick.low_price,
        pre_close: tick.pre_close,
        bid_prices: tick.bid_prices,
        ask_prices: tick.ask_prices,
        bid_volumes: tick.bid_volumes,
        ask_volumes: tick.ask_volumes,
        localtime: tick.localtime,
    })
}

/// Decodes a tick payload, taking identity from the key.
pub fn decode_tick(
    bytes: &[u8],
    partition: &TickPartition,
    datetime: DateTime<FixedOffset>,
) -> StorageResult<TickData> {
    let body: TickBody = open("tick", bytes)?;
    Ok(TickData {
        symbol: partition.symbol.clone(),
        exchange: partition.exchange.clone(),
        datetime,
        name: body.name,
        volume: body.volume,
        turnover: body.turnover,
        open_interest: body.open_interest,
        last_price: body.last_price,
        last_volume: body.last_volume,
        limit_up: body.limit_up,
        limit_down: body.limit_down,
        open_price: body.open_price,
        high_price: body.high_price,
        low_price: body.low_price,
        pre_close: body.pre_close,
        bid_prices: body.bid_prices,
        ask_prices: body.ask_prices,
        bid_volumes: body.bid_volumes,
        ask_volumes: body.ask_volumes,
        localtime: body.localtime,
    })
}

/// Encodes a bar overview.
pub fn encode_bar_overview(overview: &BarOverview) -> StorageResult<Vec<u8>> {
    seal(overview)
}

/// Decodes a bar overview.
pub fn decode_bar_overview(bytes: &[u8]) -> StorageResult<BarOverview> {
    open("bar overview", bytes)
}

/// Encodes a tick overview.
pub fn encode_tick_overview(overview: &TickOverview) -> StorageResult<Vec<u8>> {
    seal(overview)
}

/// Decodes a tick overview.
pub fn decode_tick_overview(bytes: &[u8]) -> StorageResult<TickOverview> {
    open("tick overview", bytes)
}

fn seal<T: Serialize>(body: &T) -> StorageResult<Vec<u8>> {
    let mut out = vec![SCHEMA_VERSION];
    serde_json::to_writer(&mut out, body)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(out)
}

fn open<T: DeserializeOwned>(record: &'static str, bytes: &[u8]) -> StorageResult<T> {
    match bytes.split_first() {
        Some((&SCHEMA_VERSION, body)) => {
            serde_json::from_slice(body).map_err(|e| StorageError::decode(record, e.to_string()))
        }
        Some((version, _)) => Err(StorageError::decode(
            record,
            format!("unknown schema version {version}"),
        )),
        None => Err(StorageError::decode(record, "empty payload")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use tickvault_core::{Exchange, Interval};

    fn when() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 2, 9, 31, 0)
            .unwrap()
    }

    fn sample_bar() -> BarData {
        BarData::new("BTCUSDT", Exchange::new("BINANCE"), Interval::Minute, when())
            .with_prices(dec!(42000.1), dec!(42100), dec!(41950.55), dec!(42080))
            .with_volume(dec!(12.345678), dec!(519381.2297))
            .with_open_interest(dec!(0))
    }

    fn sample_tick() -> TickData {
        let mut tick = TickData::new("rb2405", Exchange::new("SHFE"), when())
            .with_last(dec!(3851), dec!(4))
            .with_level(0, (dec!(3850), dec!(120)), (dec!(3852), dec!(87)))
            .with_level(3, (dec!(3847), dec!(9)), (dec!(3855), dec!(31)));
        tick.name = "螺纹钢2405".to_string();
        tick.limit_up = dec!(4120);
        tick.limit_down = dec!(3585);
        tick.pre_close = dec!(3849);
        tick.localtime = Some(when() + chrono::Duration::milliseconds(35));
        tick
    }

    #[test]
    fn test_bar_round_trip() {
        let bar = sample_bar();
        let bytes = encode_bar(&bar).unwrap();
        assert_eq!(bytes[0], SCHEMA_VERSION);

        let decoded = decode_bar(&bytes, &BarPartition::of(&bar), bar.datetime).unwrap();
        assert_eq!(decoded, bar);
    }

    #[test]
    fn test_tick_round_trip() {
        let tick = sample_tick();
        let bytes = encode_tick(&tick).unwrap();

        let decoded = decode_tick(&bytes, &TickPartition::of(&tick), tick.datetime).unwrap();
        assert_eq!(decoded, tick);
    }

    #[test]
    fn test_payload_omits_key_fields() {
        let bytes = encode_bar(&sample_bar()).unwrap();
        let body = std::str::from_utf8(&bytes[1..]).unwrap();
        assert!(!body.contains("BTCUSDT"));
        assert!(!body.contains("BINANCE"));
    }

    #[test]
    fn test_overview_round_trip() {
        let overview = BarOverview {
            symbol: "BTCUSDT".to_string(),
            exchange: Exchange::new("BINANCE"),
            interval: Interval::Minute,
            count: 3,
            start: when(),
            end: when() + chrono::Duration::minutes(2),
        };
        let bytes = encode_bar_overview(&overview).unwrap();
        assert_eq!(decode_bar_overview(&bytes).unwrap(), overview);

        let overview = TickOverview {
            symbol: "rb2405".to_string(),
            exchange: Exchange::new("SHFE"),
            count: 1,
            start: when(),
            end: when(),
        };
        let bytes = encode_tick_overview(&overview).unwrap();
        assert_eq!(decode_tick_overview(&bytes).unwrap(), overview);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut bytes = encode_bar(&sample_bar()).unwrap();
        bytes[0] = 9;
        let err = decode_bar(&bytes, &BarPartition::of(&sample_bar()), when()).unwrap_err();
        assert!(err.to_string().contains("unknown schema version 9"));
    }

    #[test]
    fn test_corrupt_payload_rejected() {
        let partition = TickPartition::new(Exchange::new("SHFE"), "rb2405");
        assert!(matches!(
            decode_tick(&[], &partition, when()),
            Err(StorageError::Decode { record: "tick", .. })
        ));
        assert!(matches!(
            decode_tick(&[SCHEMA_VERSION, b'{'], &partition, when()),
            Err(StorageError::Decode { record: "tick", .. })
        ));

        // A bar body is not a valid tick body.
        let bar_bytes = encode_bar(&sample_bar()).unwrap();
        assert!(decode_tick(&bar_bytes, &partition, when()).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let mut bytes = vec![SCHEMA_VERSION];
        bytes.extend_from_slice(
            br#"{"volume":"1","turnover":"1","open_interest":"0","open_price":"1","high_price":"1","low_price":"1","close_price":"1","vwap":"1"}"#,
        );
        assert!(decode_bar(&bytes, &BarPartition::of(&sample_bar()), when()).is_err());
    }
}
