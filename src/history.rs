//! # In-memory reading history.
//!
//! [`HistoryRecorder`] is an ordinary store subscriber: on every notification it
//! reads [`SharedStore::current`] and keeps it if at least
//! [`HistoryConfig::min_interval`] passed since the last kept reading (by reading
//! timestamp). The ring is bounded by [`HistoryConfig::capacity`].
//!
//! Persisting the history is left to the caller (e.g. a periodic task draining
//! [`HistoryRecorder::entries`] into a database).
//!
//! ```text
//! notify_all() ──► recorder callback ──► store.current() ──► interval elapsed? ──► ring.push_back
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::reading::Reading;
use crate::store::{SharedStore, SubscriptionId};

/// Sampling settings for a [`HistoryRecorder`].
#[derive(Clone, Debug)]
pub struct HistoryConfig {
    /// Minimum spacing between kept readings (`0s` = keep every reading).
    pub min_interval: Duration,
    /// Maximum number of kept readings; the oldest is evicted first (min 1).
    pub capacity: usize,
}

impl Default for HistoryConfig {
    /// One reading per minute, one day's worth.
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(60),
            capacity: 24 * 60,
        }
    }
}

struct Ring<T> {
    capacity: usize,
    min_interval: Duration,
    entries: VecDeque<Arc<Reading<T>>>,
}

impl<T> Ring<T> {
    fn offer(&mut self, reading: Arc<Reading<T>>) -> bool {
        if let Some(last) = self.entries.back() {
            if Arc::ptr_eq(last, &reading) {
                return false;
            }
            let elapsed = (reading.at() - last.at()).to_std().unwrap_or(Duration::ZERO);
            if elapsed < self.min_interval {
                return false;
            }
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(reading);
        true
    }
}

/// Bounded, interval-sampled history of a store's readings.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use feedvisor::{HistoryConfig, HistoryRecorder, SharedStore};
///
/// let store: Arc<SharedStore<f32>> = Arc::new(SharedStore::new());
/// let history = HistoryRecorder::attach(&store, HistoryConfig {
///     min_interval: Duration::from_secs(300),
///     capacity: 288,
/// });
/// assert!(history.is_empty());
/// history.detach();
/// ```
pub struct HistoryRecorder<T> {
    ring: Arc<Mutex<Ring<T>>>,
    store: Weak<SharedStore<T>>,
    subscription: SubscriptionId,
}

impl<T: Send + Sync + 'static> HistoryRecorder<T> {
    /// Subscribes a new recorder to `store`.
    ///
    /// The subscription only holds a weak reference to the store.
    pub fn attach(store: &Arc<SharedStore<T>>, cfg: HistoryConfig) -> Self {
        let ring = Arc::new(Mutex::new(Ring {
            capacity: cfg.capacity.max(1),
            min_interval: cfg.min_interval,
            entries: VecDeque::new(),
        }));

        let weak = Arc::downgrade(store);
        let cb_ring = Arc::clone(&ring);
        let cb_store = weak.clone();
        let subscription = store.subscribe(move || {
            let Some(reading) = cb_store.upgrade().and_then(|s| s.current()) else {
                return;
            };
            if cb_ring.lock().offer(reading) {
                log::trace!(target: "feedvisor", "history: reading recorded");
            }
        });

        Self {
            ring,
            store: weak,
            subscription,
        }
    }

    /// Kept readings, oldest first.
    pub fn entries(&self) -> Vec<Arc<Reading<T>>> {
        self.ring.lock().entries.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<Arc<Reading<T>>> {
        self.ring.lock().entries.back().cloned()
    }

    pub fn len(&self) -> usize {
        self.ring.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unsubscribes from the store; returns the kept readings.
    ///
    /// Dropping the recorder unsubscribes as well.
    pub fn detach(self) -> Vec<Arc<Reading<T>>> {
        self.entries()
    }
}

impl<T> Drop for HistoryRecorder<T> {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.unsubscribe(self.subscription);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn at(min: u32, sec: u32) -> Reading<u32> {
        Reading::new(Local.with_ymd_and_hms(2024, 1, 1, 8, min, sec).unwrap(), min * 60 + sec)
    }

    fn feed(store: &SharedStore<u32>, r: Reading<u32>) {
        store.publish(r);
        store.notify_all();
    }

    #[test]
    fn samples_by_reading_timestamp() {
        let store: Arc<SharedStore<u32>> = Arc::new(SharedStore::new());
        let history = HistoryRecorder::attach(
            &store,
            HistoryConfig {
                min_interval: Duration::from_secs(60),
                capacity: 10,
            },
        );

        feed(&store, at(0, 0));
        feed(&store, at(0, 30));
        feed(&store, at(1, 0));
        feed(&store, at(1, 59));

        let kept: Vec<u32> = history.entries().iter().map(|r| *r.payload()).collect();
        assert_eq!(kept, vec![0, 60]);
    }

    #[test]
    fn evicts_oldest_when_full() {
        let store: Arc<SharedStore<u32>> = Arc::new(SharedStore::new());
        let history = HistoryRecorder::attach(
            &store,
            HistoryConfig {
                min_interval: Duration::ZERO,
                capacity: 2,
            },
        );

        for s in 1..=3 {
            feed(&store, at(0, s));
        }
        assert_eq!(history.len(), 2);
        assert_eq!(*history.latest().unwrap().payload(), 3);
        assert_eq!(*history.entries()[0].payload(), 2);
    }

    #[test]
    fn same_reading_is_not_recorded_twice() {
        let store: Arc<SharedStore<u32>> = Arc::new(SharedStore::new());
        let history = HistoryRecorder::attach(
            &store,
            HistoryConfig {
                min_interval: Duration::ZERO,
                capacity: 8,
            },
        );

        feed(&store, at(0, 1));
        store.notify_all();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn detach_unsubscribes() {
        let store: Arc<SharedStore<u32>> = Arc::new(SharedStore::new());
        let history = HistoryRecorder::attach(&store, HistoryConfig::default());
        assert_eq!(store.subscriber_count(), 1);

        feed(&store, at(0, 0));
        let kept = history.detach();
        assert_eq!(kept.len(), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn dropping_the_recorder_unsubscribes() {
        let store: Arc<SharedStore<u32>> = Arc::new(SharedStore::new());
        for _ in 0..3 {
            let history = HistoryRecorder::attach(&store, HistoryConfig::default());
            feed(&store, at(0, 0));
            assert_eq!(history.len(), 1);
        }
        assert_eq!(store.subscriber_count(), 0);
    }
}
