//! # Lifecycle events emitted by the supervisor and its acquisition loop.
//!
//! [`EventKind`] falls into four groups:
//! - **startup**: `Starting`, `SetupFailed`, `Running`
//! - **cycles**: `ReadingPublished`, `NoDataAvailable`, `MalformedData`, `BackoffScheduled`
//! - **shutdown**: `StopRequested`, `StoppedWithinGrace`, `GraceExceeded`, `LoopExited`,
//!   `LoopCrashed`, `CleanupFinished`
//! - **fan-out**: `SubscriberPanicked`, `ObserverPanicked`, `ObserverOverflow`
//!
//! Every event carries a global monotonic `seq`.
//!
//! ## Example
//! ```rust
//! use feedvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::MalformedData)
//!     .with_source("boiler")
//!     .with_cycle(7)
//!     .with_payload("T=??;CRC=00")
//!     .with_reason("checksum mismatch");
//!
//! assert_eq!(ev.cycle, Some(7));
//! assert_eq!(ev.payload.as_deref(), Some("T=??;CRC=00"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Startup ===
    /// `start()` accepted; the pre-loop hook is about to run.
    ///
    /// Sets: `source`
    Starting,

    /// The pre-loop hook failed; the supervisor is back to stopped.
    ///
    /// Sets: `source`, `reason`
    SetupFailed,

    /// The loop has been spawned.
    ///
    /// Sets: `source`
    Running,

    // === Cycles ===
    /// A reading was published and subscribers were notified.
    ///
    /// Sets: `source`, `cycle`
    ReadingPublished,

    /// The source reported no new sample; cycle skipped.
    ///
    /// Sets: `source`, `cycle`, `reason`
    NoDataAvailable,

    /// The source received data it could not parse; cycle skipped.
    ///
    /// Sets: `source`, `cycle`, `reason`, `payload` (raw data)
    MalformedData,

    /// A safety delay was scheduled after a transient failure.
    ///
    /// Sets: `source`, `cycle`, `delay_ms`
    BackoffScheduled,

    // === Shutdown ===
    /// `stop()` cancelled the loop.
    ///
    /// Sets: `source`, `grace_ms`
    StopRequested,

    /// The loop exited within the grace period.
    ///
    /// Sets: `source`
    StoppedWithinGrace,

    /// The grace period elapsed before the loop exited; the loop was detached.
    ///
    /// Sets: `source`, `grace_ms`
    GraceExceeded,

    /// The loop returned normally (cancellation observed).
    ///
    /// Sets: `source`, `cycle` (last cycle number)
    LoopExited,

    /// The loop terminated on an unclassified failure or panic.
    ///
    /// Sets: `source`, `cycle` (if known), `reason`
    LoopCrashed,

    /// The post-loop hook finished.
    ///
    /// Sets: `source`
    CleanupFinished,

    // === Fan-out ===
    /// A store subscriber panicked during notification.
    ///
    /// Sets: `source`, `cycle`, `reason` (subscription id + panic info)
    SubscriberPanicked,

    /// An observer panicked while handling an event.
    ///
    /// Sets: `source` (observer name), `reason`
    ObserverPanicked,

    /// An observer's queue was full or closed; the event was dropped for it.
    ///
    /// Sets: `source` (observer name), `reason`
    ObserverOverflow,
}

/// Lifecycle event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Data source (or observer) the event refers to.
    pub source: Option<Arc<str>>,
    /// Fetch cycle number (1-based, per `start()`).
    pub cycle: Option<u64>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
    /// Raw payload of malformed data.
    pub payload: Option<Arc<str>>,
    /// Backoff delay in milliseconds.
    pub delay_ms: Option<u32>,
    /// Grace period in milliseconds.
    pub grace_ms: Option<u32>,
}

impl Event {
    /// Creates an event with the current timestamp and the next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            source: None,
            cycle: None,
            reason: None,
            payload: None,
            delay_ms: None,
            grace_ms: None,
        }
    }

    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[inline]
    pub fn with_cycle(mut self, cycle: u64) -> Self {
        self.cycle = Some(cycle);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_payload(mut self, payload: impl Into<Arc<str>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(millis(d));
        self
    }

    /// Attaches a grace period (stored as milliseconds).
    #[inline]
    pub fn with_grace(mut self, d: Duration) -> Self {
        self.grace_ms = Some(millis(d));
        self
    }

    /// Creates an observer overflow event.
    pub(crate) fn observer_overflow(observer: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::ObserverOverflow)
            .with_source(observer)
            .with_reason(reason)
    }

    /// Creates an observer panic event.
    pub(crate) fn observer_panicked(observer: &'static str, info: String) -> Self {
        Event::new(EventKind::ObserverPanicked)
            .with_source(observer)
            .with_reason(info)
    }
}

fn millis(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::Starting);
        let b = Event::new(EventKind::Running);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn durations_saturate_at_u32_millis() {
        let ev = Event::new(EventKind::GraceExceeded).with_grace(Duration::from_secs(u64::MAX));
        assert_eq!(ev.grace_ms, Some(u32::MAX));
    }
}
