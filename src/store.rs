//! Sample storage seam and an in-memory implementation
//!
//! The history view only needs three operations from storage: append a
//! reading, fetch the latest one, and fetch a time window. [`SampleStore`]
//! captures that; [`MemoryStore`] backs the CLI and the tests.

use crate::aggregator::{aggregate_in, AggregatedPoint};
use crate::range::Range;
use crate::samples::{Sample, Timestamp};
use chrono::{DateTime, Duration, TimeZone, Utc};
use log::{debug, warn};
use std::collections::VecDeque;
use std::fmt;

/// Source of raw heart-rate samples
pub trait SampleStore: Send {
    /// Record a new sample
    fn insert(&mut self, sample: Sample);

    /// Most recent sample by timestamp
    fn latest(&self) -> Option<Sample>;

    /// Samples with `start <= timestamp <= end`, oldest first
    fn query(&self, start: Timestamp, end: Timestamp) -> Vec<Sample>;

    /// Samples from the `window` ending at `now`
    fn recent(&self, now: Timestamp, window: Duration) -> Vec<Sample> {
        self.query(now - window, now)
    }
}

/// Bounded in-memory sample store
///
/// Keeps samples ordered by timestamp. When more than `capacity` samples
/// are held, the oldest are dropped.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    buffer: VecDeque<Sample>,
    capacity: usize,
}

impl MemoryStore {
    /// Create an empty store holding at most `capacity` samples
    ///
    /// # Examples
    ///
    /// ```
    /// use heartwatch::store::{MemoryStore, SampleStore};
    /// use heartwatch::samples::Sample;
    /// use chrono::Utc;
    ///
    /// let mut store = MemoryStore::new(1000);
    /// store.insert(Sample::new(Utc::now(), 72));
    /// assert_eq!(store.latest().map(|s| s.heart_rate), Some(72));
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::new(),
            capacity,
        }
    }

    /// Create a store preloaded with `samples`
    ///
    /// Samples beyond `capacity` are dropped oldest first, with a warning.
    pub fn with_samples(capacity: usize, samples: impl IntoIterator<Item = Sample>) -> Self {
        let mut store = Self::new(capacity);
        let mut dropped = 0;
        for sample in samples {
            dropped += store.insert_sorted(sample);
        }
        if dropped > 0 {
            warn!(
                "Sample store capacity {} exceeded, dropped {} oldest samples",
                capacity, dropped
            );
        }
        store
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Insert in timestamp order and return how many old samples were evicted
    fn insert_sorted(&mut self, sample: Sample) -> usize {
        // Readings normally arrive in order, so this is usually a push_back
        let position = self
            .buffer
            .partition_point(|existing| existing.timestamp <= sample.timestamp);
        self.buffer.insert(position, sample);

        let mut dropped = 0;
        while self.buffer.len() > self.capacity {
            self.buffer.pop_front();
            dropped += 1;
        }
        dropped
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        // Roughly one year of readings at one per minute
        Self::new(525_600)
    }
}

impl SampleStore for MemoryStore {
    fn insert(&mut self, sample: Sample) {
        if self.insert_sorted(sample) > 0 {
            debug!("Sample store at capacity {}, evicted oldest", self.capacity);
        }
    }

    fn latest(&self) -> Option<Sample> {
        self.buffer.back().copied()
    }

    fn query(&self, start: Timestamp, end: Timestamp) -> Vec<Sample> {
        self.buffer
            .iter()
            .filter(|sample| sample.timestamp >= start && sample.timestamp <= end)
            .copied()
            .collect()
    }
}

/// Fetch the window for `range` ending at `now` and aggregate it
///
/// Labels are derived in `now`'s time zone.
pub fn history<S, Tz>(store: &S, range: Range, now: &DateTime<Tz>) -> Vec<AggregatedPoint>
where
    S: SampleStore + ?Sized,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let (start, end) = range.window(now);
    let samples = store.query(start.with_timezone(&Utc), end.with_timezone(&Utc));
    debug!("Fetched {} samples for {} history", samples.len(), range);

    aggregate_in(&samples, range, &now.timezone())
}
