//! Property-based tests for storage invariants.
//!
//! These tests verify properties that must hold for any input:
//! - Keys sort in the same order as their timestamps
//! - A load returns exactly the saved records inside the range, ascending
//! - The overview matches the partition after any sequence of saves/deletes

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tickvault_storage::keys::{bar_prefix, tick_key, timestamp_key};
use tickvault_storage::prelude::*;

// =============================================================================
// TEST DATA GENERATORS
// =============================================================================

fn origin() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 1, 2, 0, 0, 0)
        .unwrap()
}

/// Microsecond offsets spanning several days.
fn micros() -> impl Strategy<Value = i64> {
    0i64..400_000_000_000
}

fn bar_at(minute: i64, close: i64) -> BarData {
    BarData::new(
        "BTCUSDT",
        Exchange::new("BINANCE"),
        Interval::Minute,
        origin() + Duration::minutes(minute),
    )
    .with_prices(Decimal::ONE, Decimal::ONE, Decimal::ONE, Decimal::from(close))
}

#[derive(Debug, Clone)]
enum Op {
    Save { minutes: Vec<i64>, append_hint: bool },
    Delete,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        8 => (prop::collection::vec(0i64..120, 1..12), any::<bool>())
            .prop_map(|(minutes, append_hint)| Op::Save { minutes, append_hint }),
        1 => Just(Op::Delete),
    ]
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #[test]
    fn prop_key_order_matches_time_order(a in micros(), b in micros()) {
        let ta = origin() + Duration::microseconds(a);
        let tb = origin() + Duration::microseconds(b);
        let ka = tick_key(&Exchange::new("SSE"), "600036", &ta).unwrap();
        let kb = tick_key(&Exchange::new("SSE"), "600036", &tb).unwrap();
        prop_assert_eq!(ka.cmp(&kb), ta.cmp(&tb));
    }

    #[test]
    fn prop_key_order_holds_across_offsets(a in micros(), b in micros()) {
        // Keys are compared after normalization to one zone.
        let east = FixedOffset::east_opt(9 * 3600).unwrap();
        let prefix = bar_prefix(&Exchange::new("CFFEX"), "IF2401", Interval::Minute).unwrap();
        let ta = (origin() + Duration::microseconds(a)).with_timezone(&east);
        let tb = (origin() + Duration::microseconds(b)).with_timezone(&east);
        let ka = timestamp_key(&prefix, &ta).unwrap();
        let kb = timestamp_key(&prefix, &tb).unwrap();
        prop_assert_eq!(ka.cmp(&kb), ta.cmp(&tb));
    }

    #[test]
    fn prop_load_returns_exact_range(
        minutes in prop::collection::vec(0i64..240, 1..40),
        lo in 0i64..240,
        hi in 0i64..240,
    ) {
        let db = KvDatabase::in_memory(StorageTimeZone::utc());
        let bars: Vec<_> = minutes.iter().map(|&m| bar_at(m, m)).collect();
        db.save_bars(&bars, false).unwrap();

        let start = origin() + Duration::minutes(lo);
        let end = origin() + Duration::minutes(hi);
        let loaded = db
            .load_bars("BTCUSDT", &Exchange::new("BINANCE"), Interval::Minute, start, end)
            .unwrap();

        let mut expected: Vec<i64> = minutes.iter().copied().filter(|m| (lo..=hi).contains(m)).collect();
        expected.sort_unstable();
        expected.dedup();
        let got: Vec<i64> = loaded
            .iter()
            .map(|b| (b.datetime - origin()).num_minutes())
            .collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_overview_tracks_partition(ops in prop::collection::vec(op(), 1..20)) {
        let db = KvDatabase::in_memory(StorageTimeZone::utc());
        let mut model: BTreeMap<i64, i64> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Save { minutes, append_hint } => {
                    let bars: Vec<_> = minutes.iter().map(|&m| bar_at(m, m + 1000)).collect();
                    db.save_bars(&bars, append_hint).unwrap();
                    for m in minutes {
                        model.insert(m, m + 1000);
                    }
                }
                Op::Delete => {
                    let deleted = db
                        .delete_bars("BTCUSDT", &Exchange::new("BINANCE"), Interval::Minute)
                        .unwrap();
                    prop_assert_eq!(deleted, model.len());
                    model.clear();
                }
            }

            let overviews = db.list_bar_overviews().unwrap();
            match (model.keys().next(), model.keys().next_back()) {
                (Some(&first), Some(&last)) => {
                    prop_assert_eq!(overviews.len(), 1);
                    prop_assert_eq!(overviews[0].count, model.len() as u64);
                    prop_assert_eq!(overviews[0].start, origin() + Duration::minutes(first));
                    prop_assert_eq!(overviews[0].end, origin() + Duration::minutes(last));
                }
                _ => prop_assert!(overviews.is_empty()),
            }
        }
    }
}
