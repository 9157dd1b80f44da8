//! The point store: latest value per key plus change detection.
//!
//! [`PointStore`] keeps one current [`Point`] per `u64` key and decides, for
//! each incoming update, whether it is significant enough to replace what is
//! stored. It is the only shared mutable state in the crate.
//!
//! # Locking
//!
//! A single `parking_lot::RwLock` guards the whole key space:
//!
//! - [`get`](PointStore::get), [`get_copy`](PointStore::get_copy) and
//!   the size accessors take the read lock and run concurrently.
//! - [`put`](PointStore::put), [`is_point_changed`](PointStore::is_point_changed)
//!   and [`get_fresh`](PointStore::get_fresh) take the write lock.
//!
//! Critical sections are a single map operation plus a clone; no I/O, clock
//! reads or logging happen under the lock. The coarse lock serialises writers
//! across distinct keys, which caps write throughput at one writer at a time.
//! That fits per-point telemetry rates; sharding the map is the upgrade path
//! if contention shows up.
//!
//! `is_point_changed` holds the write lock across both the comparison and the
//! replacement, so concurrent updates to the same key are linearizable: of N
//! identical candidates racing on an empty key, exactly one reports a change.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rtdb::{IsoTimestamp, Point, PointStore, Priority};
//!
//! let store = Arc::new(PointStore::new());
//! let ts = IsoTimestamp::parse_or_now("2024-03-01T12:00:00+0000");
//!
//! assert!(store.is_point_changed(42, Priority::ValueQuality, Point::new(10.0, 0, ts), None));
//! assert!(!store.is_point_changed(42, Priority::ValueQuality, Point::new(10.0, 0, ts), None));
//! assert!(store.is_point_changed(42, Priority::ValueQuality, Point::new(10.0, 1, ts), None));
//!
//! assert_eq!(store.get(42).map(|p| p.quality), Some(1));
//! assert!(store.get_fresh(42).is_fresh());
//! assert!(!store.get_fresh(42).is_fresh());
//! ```

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use parking_lot::RwLock;

use crate::config::{FilterConfig, StoreConfig};
use crate::point::Point;
use crate::policy::Priority;
use crate::timestamp::IsoTimestamp;

/// Outcome of [`PointStore::get_fresh`].
#[derive(Debug, Clone, PartialEq)]
pub enum FreshRead {
    /// The point had unread data. The flag has been cleared; the point is
    /// returned as stored after clearing.
    Fresh(Point),
    /// The point exists but was already consumed. Carries the stale value for
    /// inspection only; it is not a valid fresh read.
    Stale(Point),
    /// No point is stored for the key.
    Missing,
}

impl FreshRead {
    /// Returns `true` for [`FreshRead::Fresh`].
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }

    /// Returns the point only if the read was fresh.
    pub fn into_fresh(self) -> Option<Point> {
        match self {
            Self::Fresh(point) => Some(point),
            Self::Stale(_) | Self::Missing => None,
        }
    }

    /// Returns the point whether fresh or stale.
    pub fn into_point(self) -> Option<Point> {
        match self {
            Self::Fresh(point) | Self::Stale(point) => Some(point),
            Self::Missing => None,
        }
    }
}

/// Thread-safe map from key to the latest [`Point`].
///
/// Entries are created on first write and are never evicted.
///
/// # Thread Safety
///
/// All methods take `&self`. Share the store between threads with `Arc`.
#[derive(Debug, Default)]
pub struct PointStore {
    /// Write-path behavior.
    config: StoreConfig,
    /// Current point per key.
    points: RwLock<HashMap<u64, Point>>,
}

impl PointStore {
    /// Creates an empty store with the default [`StoreConfig`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            points: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Applies write-time bookkeeping. Runs before the lock is taken.
    fn admit(&self, mut point: Point) -> Point {
        if self.config.track_freshness {
            point.has_fresh_data = true;
        }
        if self.config.stamp_received && point.timestamp_received.is_none() {
            point.timestamp_received = Some(IsoTimestamp::now());
        }
        point
    }

    /// Stores `point` for `key`, replacing any previous value.
    pub fn put(&self, key: u64, point: Point) {
        let point = self.admit(point);
        self.points.write().insert(key, point);
    }

    /// Returns a copy of the current point for `key`.
    pub fn get(&self, key: u64) -> Option<Point> {
        self.points.read().get(&key).cloned()
    }

    /// Reads `key` and clears its freshness flag in one step.
    ///
    /// Returns [`FreshRead::Fresh`] at most once per write. Takes the write
    /// lock because it mutates the stored flag.
    pub fn get_fresh(&self, key: u64) -> FreshRead {
        let mut points = self.points.write();
        match points.get_mut(&key) {
            Some(point) if point.has_fresh_data => {
                point.has_fresh_data = false;
                FreshRead::Fresh(point.clone())
            }
            Some(point) => FreshRead::Stale(point.clone()),
            None => FreshRead::Missing,
        }
    }

    /// Returns a deep copy of every entry.
    ///
    /// The copy is taken under one read lock, so it is a consistent snapshot.
    /// Mutating it does not affect the store.
    pub fn get_copy(&self) -> HashMap<u64, Point> {
        self.points.read().clone()
    }

    /// Decides whether `point` is a significant change for `key` and stores
    /// it if so.
    ///
    /// - No stored point: `point` is stored and `true` is returned.
    /// - `priority` judges it changed (see [`Priority::is_changed`]): `point`
    ///   replaces the stored one and `true` is returned.
    /// - Otherwise the store is left untouched and `false` is returned.
    ///
    /// The comparison and the replacement happen under one write lock.
    pub fn is_point_changed(
        &self,
        key: u64,
        priority: Priority,
        point: Point,
        aperture: Option<f64>,
    ) -> bool {
        let point = self.admit(point);

        let (changed, first) = {
            let mut points = self.points.write();
            match points.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(point);
                    (true, true)
                }
                Entry::Occupied(mut slot) => {
                    if priority.is_changed(slot.get(), &point, aperture) {
                        slot.insert(point);
                        (true, false)
                    } else {
                        (false, false)
                    }
                }
            }
        };

        if first {
            tracing::trace!(key, "first point for key");
        } else if !changed {
            tracing::trace!(key, %priority, "update suppressed");
        }

        changed
    }

    /// [`is_point_changed`](Self::is_point_changed) with the priority and
    /// aperture taken from a [`FilterConfig`].
    pub fn is_point_changed_with(&self, key: u64, point: Point, filter: &FilterConfig) -> bool {
        self.is_point_changed(key, filter.priority, point, filter.aperture)
    }

    /// Returns the number of keys stored.
    pub fn len(&self) -> usize {
        self.points.read().len()
    }

    /// Returns `true` if no key has been written.
    pub fn is_empty(&self) -> bool {
        self.points.read().is_empty()
    }

    /// Returns `true` if a point is stored for `key`.
    pub fn contains_key(&self, key: u64) -> bool {
        self.points.read().contains_key(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> IsoTimestamp {
        IsoTimestamp::parse(s).unwrap()
    }

    fn point(value: f64, quality: u32) -> Point {
        Point::new(value, quality, ts("2024-03-01T12:00:00+0000"))
    }

    #[test]
    fn test_put_and_get() {
        let store = PointStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get(1), None);

        store.put(1, point(3.5, 0));
        assert_eq!(store.get(1), Some(point(3.5, 0)));
        assert_eq!(store.len(), 1);
        assert!(store.contains_key(1));
        assert!(!store.contains_key(2));

        store.put(1, point(4.5, 2));
        assert_eq!(store.get(1), Some(point(4.5, 2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_first_point_is_always_a_change() {
        for priority in [
            Priority::ValueQuality,
            Priority::ValueQualityTimestamp,
            Priority::Deadband,
        ] {
            let store = PointStore::new();
            assert!(store.is_point_changed(9, priority, point(0.0, 0), Some(1_000.0)));
            assert_eq!(store.get(9), Some(point(0.0, 0)));
        }
    }

    #[test]
    fn test_value_quality_scenario() {
        let store = PointStore::new();

        assert!(store.is_point_changed(42, Priority::ValueQuality, point(10.0, 0), None));
        assert_eq!(store.get(42), Some(point(10.0, 0)));

        assert!(!store.is_point_changed(42, Priority::ValueQuality, point(10.0, 0), None));

        assert!(store.is_point_changed(42, Priority::ValueQuality, point(10.0, 1), None));
        assert_eq!(store.get(42), Some(point(10.0, 1)));
    }

    #[test]
    fn test_deadband_scenario() {
        let store = PointStore::new();
        store.put(7, point(100.0, 0));

        assert!(!store.is_point_changed(7, Priority::Deadband, point(100.4, 0), Some(0.5)));
        assert_eq!(store.get(7).map(|p| p.value), Some(100.0));

        assert!(store.is_point_changed(7, Priority::Deadband, point(100.6, 0), Some(0.5)));
        assert_eq!(store.get(7).map(|p| p.value), Some(100.6));
    }

    #[test]
    fn test_suppressed_update_leaves_store_untouched() {
        let store = PointStore::new();
        let original = Point::new(5.0, 0, ts("2024-03-01T12:00:00+0000"));
        store.put(1, original.clone());

        // consume freshness, then send a non-change
        assert!(store.get_fresh(1).is_fresh());
        let later = Point::new(5.0, 0, ts("2024-03-01T12:00:05+0000"));
        assert!(!store.is_point_changed(1, Priority::ValueQuality, later, None));

        let stored = store.get(1).unwrap();
        assert_eq!(stored.timestamp, original.timestamp);
        assert!(!stored.has_fresh_data);
    }

    #[test]
    fn test_get_fresh_once_per_write() {
        let store = PointStore::new();
        assert_eq!(store.get_fresh(3), FreshRead::Missing);

        store.put(3, point(1.0, 0));
        let first = store.get_fresh(3);
        assert!(first.is_fresh());
        assert!(!first.into_fresh().unwrap().has_fresh_data);

        let second = store.get_fresh(3);
        assert!(!second.is_fresh());
        assert_eq!(second.clone().into_fresh(), None);
        assert_eq!(second.into_point().map(|p| p.value), Some(1.0));

        assert!(store.is_point_changed(3, Priority::Deadband, point(2.0, 0), None));
        assert!(store.get_fresh(3).is_fresh());
        assert!(!store.get_fresh(3).is_fresh());
    }

    #[test]
    fn test_freshness_is_forced_on_write() {
        let store = PointStore::new();
        let mut consumed = point(1.0, 0);
        consumed.has_fresh_data = false;

        store.put(1, consumed);
        assert!(store.get(1).unwrap().has_fresh_data);
    }

    #[test]
    fn test_freshness_tracking_disabled() {
        let store = PointStore::with_config(StoreConfig {
            track_freshness: false,
            stamp_received: false,
        });

        let mut consumed = point(1.0, 0);
        consumed.has_fresh_data = false;
        store.put(1, consumed);
        assert!(matches!(store.get_fresh(1), FreshRead::Stale(_)));

        store.put(2, point(1.0, 0));
        assert!(store.get_fresh(2).is_fresh());
        assert!(!store.get_fresh(2).is_fresh());
    }

    #[test]
    fn test_stamp_received() {
        let store = PointStore::with_config(StoreConfig {
            track_freshness: true,
            stamp_received: true,
        });

        store.put(1, point(1.0, 0));
        assert!(store.get(1).unwrap().timestamp_received.is_some());

        let received = ts("2020-01-01T00:00:00+0000");
        store.put(2, point(1.0, 0).with_received(received));
        assert_eq!(store.get(2).unwrap().timestamp_received, Some(received));
    }

    #[test]
    fn test_get_copy_is_detached() {
        let store = PointStore::new();
        store.put(1, point(1.0, 0));
        store.put(2, point(2.0, 0));

        let mut copy = store.get_copy();
        assert_eq!(copy.len(), 2);
        assert_eq!(copy.get(&1), store.get(1).as_ref());
        assert_eq!(copy.get(&2), store.get(2).as_ref());

        copy.insert(3, point(3.0, 0));
        if let Some(p) = copy.get_mut(&1) {
            p.value = 99.0;
        }

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).map(|p| p.value), Some(1.0));
    }

    #[test]
    fn test_is_point_changed_with_filter() {
        let store = PointStore::new();
        let filter = FilterConfig::new(Priority::Deadband, Some(1.0)).unwrap();

        assert!(store.is_point_changed_with(5, point(0.0, 0), &filter));
        assert!(!store.is_point_changed_with(5, point(0.9, 0), &filter));
        assert!(store.is_point_changed_with(5, point(1.1, 0), &filter));
    }
}
