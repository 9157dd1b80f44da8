//! Property tests for change detection, fresh reads and timestamp rendering.

use proptest::prelude::*;
use rtdb::{IsoTimestamp, Point, PointStore, Priority};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Timestamps between 1970 and 2100 in whole-minute offsets within ±14h.
fn arb_timestamp() -> impl Strategy<Value = IsoTimestamp> {
    (0i64..4_102_444_800_000, -840i32..=840).prop_map(|(millis, offset_min)| {
        IsoTimestamp::from_unix_millis(millis, offset_min * 60).unwrap()
    })
}

/// A small value domain so equal values come up often.
fn arb_value() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-4i32..4).prop_map(f64::from),
        -1_000.0f64..1_000.0,
    ]
}

fn arb_point() -> impl Strategy<Value = Point> {
    (arb_value(), 0u32..3, arb_timestamp())
        .prop_map(|(value, quality, ts)| Point::new(value, quality, ts))
}

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::ValueQuality),
        Just(Priority::ValueQualityTimestamp),
        Just(Priority::Deadband),
    ]
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn first_point_is_always_stored(
        key in any::<u64>(),
        priority in arb_priority(),
        p in arb_point(),
        aperture in proptest::option::of(0.0f64..10.0),
    ) {
        let store = PointStore::new();
        prop_assert!(store.is_point_changed(key, priority, p.clone(), aperture));
        prop_assert_eq!(store.get(key), Some(p));
    }

    #[test]
    fn value_quality_rule(p0 in arb_point(), p1 in arb_point()) {
        let store = PointStore::new();
        store.put(1, p0.clone());

        let expected = p1.value != p0.value || p1.quality != p0.quality;
        let changed = store.is_point_changed(1, Priority::ValueQuality, p1.clone(), None);

        prop_assert_eq!(changed, expected);
        prop_assert_eq!(store.get(1), Some(if expected { p1 } else { p0 }));
    }

    #[test]
    fn value_quality_timestamp_rule(p0 in arb_point(), p1 in arb_point()) {
        let store = PointStore::new();
        store.put(1, p0.clone());

        let expected = p1.value != p0.value
            || p1.quality != p0.quality
            || p1.timestamp != p0.timestamp;
        let changed = store.is_point_changed(1, Priority::ValueQualityTimestamp, p1.clone(), None);

        prop_assert_eq!(changed, expected);
        prop_assert_eq!(store.get(1), Some(if expected { p1 } else { p0 }));
    }

    #[test]
    fn deadband_rule(p0 in arb_point(), p1 in arb_point(), aperture in 0.0f64..5.0) {
        let store = PointStore::new();
        store.put(1, p0.clone());

        let expected = (p1.value - p0.value).abs() > aperture;
        let changed = store.is_point_changed(1, Priority::Deadband, p1.clone(), Some(aperture));

        prop_assert_eq!(changed, expected);
        prop_assert_eq!(store.get(1), Some(if expected { p1 } else { p0 }));
    }

    #[test]
    fn deadband_boundary_is_not_a_change(base in -1_000i32..1_000, aperture in 0u8..8) {
        // Quarter steps keep the arithmetic exact.
        let aperture = f64::from(aperture) * 0.25;
        let ts = IsoTimestamp::from_unix_millis(0, 0).unwrap();
        let store = PointStore::new();
        store.put(1, Point::new(f64::from(base), 0, ts));

        let edge = Point::new(f64::from(base) + aperture, 0, ts);
        prop_assert!(!store.is_point_changed(1, Priority::Deadband, edge, Some(aperture)));
    }

    #[test]
    fn fresh_once_per_write(writes in prop::collection::vec(arb_point(), 1..10)) {
        let store = PointStore::new();
        for p in writes {
            store.put(1, p);
            prop_assert!(store.get_fresh(1).is_fresh());
            prop_assert!(!store.get_fresh(1).is_fresh());
        }
    }

    #[test]
    fn copy_matches_gets_and_is_detached(
        entries in prop::collection::vec((0u64..32, arb_point()), 0..32),
    ) {
        let store = PointStore::new();
        for (key, p) in &entries {
            store.put(*key, p.clone());
        }

        let mut copy = store.get_copy();
        prop_assert_eq!(copy.len(), store.len());
        for (key, p) in &copy {
            let got = store.get(*key);
            prop_assert_eq!(got.as_ref(), Some(p));
        }

        copy.clear();
        for (key, _) in &entries {
            prop_assert!(store.get(*key).is_some());
        }
    }

    #[test]
    fn wire_round_trip_to_millis(ts in arb_timestamp()) {
        let parsed = IsoTimestamp::parse(&ts.to_wire()).unwrap();
        prop_assert_eq!(parsed, ts);
        prop_assert_eq!(
            parsed.as_datetime().offset(),
            ts.as_datetime().offset()
        );
    }

    #[test]
    fn malformed_text_parses_to_now(s in "[a-zA-Z ]{0,24}") {
        let ts = IsoTimestamp::parse_or_now(&s);
        let age = IsoTimestamp::now()
            .as_datetime()
            .signed_duration_since(*ts.as_datetime());
        prop_assert!(age.num_seconds().abs() < 5);
    }
}
