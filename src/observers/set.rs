//! # Non-blocking event fan-out to observers.
//!
//! ## Rules
//! - `emit()` returns immediately (`try_send`).
//! - Per-observer FIFO; no ordering across observers.
//! - Overflow drops the event for that observer only and publishes `ObserverOverflow`.
//! - A panicking observer is reported as `ObserverPanicked`; its worker keeps going.
//! - `ObserverOverflow` and `ObserverPanicked` stay on the bus and are never fed back
//!   to observers: an observer failing on every event would otherwise feed itself.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event, EventKind};
use crate::observers::Observe;

struct ObserverChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator: one bounded queue and one worker task per observer.
pub struct ObserverSet {
    channels: Vec<ObserverChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl ObserverSet {
    /// Creates the set and spawns one worker per observer.
    ///
    /// Must be called within a Tokio runtime.
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn Observe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(observers.len());
        let mut workers = Vec::with_capacity(observers.len());

        for obs in observers {
            let name = obs.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(obs.queue_capacity().max(1));
            let worker_bus = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = obs.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await
                    {
                        let info = panic_message(panic_err.as_ref());
                        log::error!(target: "feedvisor", "observer '{name}' panicked: {info}");
                        worker_bus.publish(Event::observer_panicked(name, info));
                    }
                }
            });
            channels.push(ObserverChannel { name, sender: tx });
            workers.push(handle);
        }
        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Sends `event` to every observer without waiting for them.
    ///
    /// Observer fan-out failures are ignored here; read them from the bus.
    pub fn emit(&self, event: Event) {
        if matches!(
            event.kind,
            EventKind::ObserverOverflow | EventKind::ObserverPanicked
        ) {
            return;
        }
        let event = Arc::new(event);

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            log::warn!(target: "feedvisor", "observer '{}' dropped event: queue {reason}", channel.name);
            self.bus.publish(Event::observer_overflow(channel.name, reason));
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Closes all queues and waits for the workers to drain them.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;

    struct Recorder(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Observe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().push(ev.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Exploder;

    #[async_trait]
    impl Observe for Exploder {
        async fn on_event(&self, _ev: &Event) {
            panic!("observer blew up");
        }
        fn name(&self) -> &'static str {
            "exploder"
        }
    }

    #[tokio::test]
    async fn delivers_in_order_and_drains_on_shutdown() {
        let rec = Arc::new(Recorder(Mutex::new(Vec::new())));
        let set = ObserverSet::new(vec![rec.clone()], Bus::new(16));
        assert_eq!(set.len(), 1);

        set.emit(Event::new(EventKind::Starting));
        set.emit(Event::new(EventKind::Running));
        set.shutdown().await;

        assert_eq!(
            *rec.0.lock(),
            vec![EventKind::Starting, EventKind::Running]
        );
    }

    #[tokio::test]
    async fn panicking_observer_is_reported_and_isolated() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let rec = Arc::new(Recorder(Mutex::new(Vec::new())));
        let set = ObserverSet::new(vec![Arc::new(Exploder), rec.clone()], bus);

        set.emit(Event::new(EventKind::Running));

        let ev = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("panic event")
            .unwrap();
        assert_eq!(ev.kind, EventKind::ObserverPanicked);
        assert_eq!(ev.source.as_deref(), Some("exploder"));
        assert_eq!(ev.reason.as_deref(), Some("observer blew up"));

        set.shutdown().await;
        assert_eq!(*rec.0.lock(), vec![EventKind::Running]);
    }

    #[tokio::test]
    async fn fan_out_failures_are_not_fed_back() {
        let rec = Arc::new(Recorder(Mutex::new(Vec::new())));
        let set = ObserverSet::new(vec![rec.clone()], Bus::new(16));

        set.emit(Event::observer_panicked("exploder", "boom".to_string()));
        set.emit(Event::observer_overflow("exploder", "full"));
        set.emit(Event::new(EventKind::CleanupFinished));
        set.shutdown().await;

        assert_eq!(*rec.0.lock(), vec![EventKind::CleanupFinished]);
    }
}
