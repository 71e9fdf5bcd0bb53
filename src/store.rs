//! Bounded per-signal time-series storage
//!
//! [`TelemetryStore`] maps each signal key to a ring buffer of
//! [`DataPoint`]s, capped at a uniform `max_points`. When a series is full,
//! the oldest points are evicted — FIFO, never sampling — so insertion order
//! stays chronological and `latest` is always O(1).
//!
//! The store is shared between the reader thread (appends) and the consumer
//! thread (queries, clear, logging ticks), so every method takes `&self` and
//! the map lives behind an interior mutex. Locks are held only across the
//! mutation itself, never across callbacks.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::types::DataPoint;

/// Default maximum number of data points retained per signal
pub const DEFAULT_MAX_POINTS: usize = 5000;

type SeriesMap = HashMap<String, VecDeque<DataPoint>>;

/// Shared time-series store for all signals
#[derive(Debug)]
pub struct TelemetryStore {
    series: Mutex<SeriesMap>,
    /// Anchor for point timestamps; fixed for the store's whole lifetime
    start: Instant,
    max_points: usize,
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POINTS)
    }
}

impl TelemetryStore {
    /// Create an empty store retaining up to `max_points` per signal
    pub fn new(max_points: usize) -> Self {
        Self {
            series: Mutex::new(HashMap::new()),
            start: Instant::now(),
            max_points,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SeriesMap> {
        self.series.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pre-create empty series for the known signal catalog
    ///
    /// Appending to an unknown key still works; this only makes the full key
    /// set visible to consumers before any data arrives.
    pub fn register_keys<I, S>(&self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = self.lock();
        for key in keys {
            map.entry(key.into()).or_default();
        }
    }

    /// Record a value for `key` at the current elapsed time
    pub fn append(&self, key: &str, value: f64) {
        let elapsed = self.start.elapsed().as_secs_f64();
        let mut map = self.lock();
        if !map.contains_key(key) {
            map.insert(key.to_string(), VecDeque::new());
        }
        if let Some(series) = map.get_mut(key) {
            series.push_back(DataPoint::new(value, elapsed));
            while series.len() > self.max_points {
                series.pop_front();
            }
        }
    }

    /// Most recent value for `key`, `None` if the series is empty or unknown
    pub fn latest(&self, key: &str) -> Option<f64> {
        self.lock()
            .get(key)
            .and_then(|series| series.back())
            .map(|point| point.value)
    }

    /// Snapshot of the full series for `key`, empty if unknown
    pub fn series(&self, key: &str) -> Vec<DataPoint> {
        self.lock()
            .get(key)
            .map(|series| series.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of points currently stored for `key`
    pub fn len(&self, key: &str) -> usize {
        self.lock().get(key).map_or(0, VecDeque::len)
    }

    /// Whether no series holds any points
    pub fn is_empty(&self) -> bool {
        self.lock().values().all(VecDeque::is_empty)
    }

    /// All known keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Empty every series in place, preserving the time anchor and bound
    pub fn clear(&self) {
        for series in self.lock().values_mut() {
            series.clear();
        }
    }

    /// Seconds elapsed since the store was created
    pub fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Configured per-signal retention bound
    pub fn max_points(&self) -> usize {
        self.max_points
    }

    /// Replace the entire contents, used by log replay
    ///
    /// The retention bound still applies: oversized replayed series keep
    /// their newest `max_points` entries.
    pub(crate) fn replace_all(&self, contents: SeriesMap) {
        let mut map = self.lock();
        *map = contents;
        for series in map.values_mut() {
            while series.len() > self.max_points {
                series.pop_front();
            }
        }
    }
}
