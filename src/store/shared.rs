//! # SharedStore implementation.
//!
//! ## Rules
//! - `current` is swapped as a whole `Arc<Reading<T>>`: readers see the old or the
//!   new reading, never a mix.
//! - `publish` is crate-private; the acquisition loop is the single writer.
//! - `notify_all` works on a snapshot of the subscriber list, so `subscribe` and
//!   `unsubscribe` may run concurrently with a fan-out (even from inside a callback).
//!   A subscriber registered during a fan-out is invoked from the next one on.
//! - A panicking callback is logged and reported in [`FanOut::failed`]; the remaining
//!   callbacks still run.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::observers::panic_message;
use crate::reading::Reading;
use crate::store::subscription::{Subscribers, SubscriptionId};

/// Result of one notification fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Callbacks that returned normally.
    pub delivered: usize,
    /// Callbacks that panicked, with the panic message.
    pub failed: Vec<(SubscriptionId, String)>,
}

/// Holds the single current [`Reading`] and the notification subscribers.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use feedvisor::SharedStore;
///
/// let store: SharedStore<f32> = SharedStore::new();
/// assert!(store.current().is_none());
///
/// let hits = Arc::new(AtomicUsize::new(0));
/// let h = hits.clone();
/// let id = store.subscribe(move || { h.fetch_add(1, Ordering::SeqCst); });
/// assert_eq!(store.subscriber_count(), 1);
/// assert!(store.unsubscribe(id));
/// ```
pub struct SharedStore<T> {
    current: RwLock<Option<Arc<Reading<T>>>>,
    version: AtomicU64,
    subscribers: Mutex<Subscribers>,
}

impl<T> Default for SharedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SharedStore<T> {
    /// Creates an empty store ("no data yet").
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            version: AtomicU64::new(0),
            subscribers: Mutex::new(Subscribers::default()),
        }
    }

    /// Latest reading, or `None` if nothing was ever published.
    pub fn current(&self) -> Option<Arc<Reading<T>>> {
        self.current.read().clone()
    }

    /// Number of publishes so far (`0` = no data yet).
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Registers a notification callback. Multiple registrations are allowed.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribers.lock().insert(Arc::new(callback))
    }

    /// Removes a callback; returns `false` if the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.lock().remove(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Atomically replaces the current reading.
    pub(crate) fn publish(&self, reading: Reading<T>) {
        let reading = Arc::new(reading);
        let mut slot = self.current.write();
        *slot = Some(reading);
        self.version.fetch_add(1, Ordering::Release);
    }

    /// Invokes every registered callback once, in registration order.
    ///
    /// Returns after all callbacks present at call time have run.
    pub(crate) fn notify_all(&self) -> FanOut {
        let subscribers = self.subscribers.lock().snapshot();
        let mut out = FanOut::default();

        for (id, cb) in subscribers {
            match catch_unwind(AssertUnwindSafe(|| cb())) {
                Ok(()) => out.delivered += 1,
                Err(panic_err) => {
                    let info = panic_message(panic_err.as_ref());
                    log::error!(target: "feedvisor", "store subscriber {id} panicked: {info}");
                    out.failed.push((id, info));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter(store: &SharedStore<u32>) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        store.subscribe(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        hits
    }

    #[test]
    fn starts_without_data() {
        let store: SharedStore<u32> = SharedStore::new();
        assert!(store.current().is_none());
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn publish_replaces_whole_reading() {
        let store = SharedStore::new();
        store.publish(Reading::now(1u32));
        let first = store.current().unwrap();
        store.publish(Reading::now(2u32));

        assert_eq!(*first.payload(), 1);
        assert_eq!(*store.current().unwrap().payload(), 2);
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn notifies_in_registration_order() {
        let store: SharedStore<u32> = SharedStore::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let o = order.clone();
            store.subscribe(move || o.lock().push(i));
        }

        let out = store.notify_all();
        assert_eq!(out.delivered, 3);
        assert!(out.failed.is_empty());
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn panicking_subscriber_does_not_stop_later_ones() {
        let store: SharedStore<u32> = SharedStore::new();
        let before = counter(&store);
        let bad = store.subscribe(|| panic!("subscriber failure"));
        let after = counter(&store);

        let out = store.notify_all();

        assert_eq!(before.load(Ordering::SeqCst), 1);
        assert_eq!(after.load(Ordering::SeqCst), 1);
        assert_eq!(out.delivered, 2);
        assert_eq!(out.failed, vec![(bad, "subscriber failure".to_string())]);
    }

    #[test]
    fn unsubscribed_callback_is_not_invoked() {
        let store: SharedStore<u32> = SharedStore::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let id = store.subscribe(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.notify_all();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn subscribing_from_inside_a_callback_does_not_deadlock() {
        let store: Arc<SharedStore<u32>> = Arc::new(SharedStore::new());
        let late_hits = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&store);
        let lh = late_hits.clone();
        store.subscribe(move || {
            if let Some(s) = weak.upgrade() {
                let lh = lh.clone();
                s.subscribe(move || {
                    lh.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        // registered during the first fan-out, invoked from the second on
        store.notify_all();
        assert_eq!(late_hits.load(Ordering::SeqCst), 0);
        store.notify_all();
        assert_eq!(late_hits.load(Ordering::SeqCst), 1);
        assert_eq!(store.subscriber_count(), 3);
    }

    #[test]
    fn subscriber_sees_published_reading() {
        let store: Arc<SharedStore<u32>> = Arc::new(SharedStore::new());
        let seen = Arc::new(Mutex::new(None));
        let (weak, s) = (Arc::downgrade(&store), seen.clone());
        store.subscribe(move || {
            *s.lock() = weak.upgrade().and_then(|st| st.current()).map(|r| *r.payload());
        });

        store.publish(Reading::now(42));
        store.notify_all();
        assert_eq!(*seen.lock(), Some(42));
    }
}
