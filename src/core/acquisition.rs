//! # Acquisition loop: fetch → classify → skip-or-publish.
//!
//! ```text
//! loop {
//!   ├─► token cancelled?  ──► exit (before blocking)
//!   ├─► cycle += 1
//!   ├─► source.fetch_one(token)            (only suspension point)
//!   │       │
//!   │       ├─ Ok(reading)  ──► store.publish ──► store.notify_all ──► ReadingPublished
//!   │       ├─ NoData       ──► warn, NoDataAvailable     ─┐
//!   │       ├─ Malformed    ──► warn + raw, MalformedData ─┴─► optional backoff, continue
//!   │       ├─ Canceled     ──► exit
//!   │       └─ anything else ─► return LoopCrash (fatal)
//! }
//! ```
//!
//! ## Rules
//! - Publish completes before notification: a subscriber invoked for cycle `n`
//!   always reads cycle `n`'s reading from the store.
//! - Notification is synchronous; a slow subscriber delays the next fetch.
//! - Without `error_backoff`, transient failures are retried with no delay.
//! - A fetch that returns a reading after cancellation is still published; the
//!   loop exits at the next loop-top check.

use std::sync::Arc;

use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::{
    error::FetchError,
    events::{Bus, Event, EventKind},
    policies::BackoffPolicy,
    reading::Reading,
    source::DataSource,
    store::SharedStore,
};

/// Fatal termination of the loop.
#[derive(Debug)]
pub(crate) struct LoopCrash {
    /// Cycle during which the failure happened (`None` for panics).
    pub cycle: Option<u64>,
    pub error: FetchError,
}

/// One acquisition loop bound to a source, a store and the event bus.
pub(crate) struct AcquisitionLoop<S: DataSource> {
    source: Arc<S>,
    store: Arc<SharedStore<S::Payload>>,
    bus: Bus,
    backoff: Option<BackoffPolicy>,
    name: Arc<str>,
}

impl<S: DataSource> AcquisitionLoop<S> {
    pub(crate) fn new(
        source: Arc<S>,
        store: Arc<SharedStore<S::Payload>>,
        bus: Bus,
        backoff: Option<BackoffPolicy>,
    ) -> Self {
        let name: Arc<str> = Arc::from(source.name());
        Self {
            source,
            store,
            bus,
            backoff,
            name,
        }
    }

    /// Runs until cancellation or a fatal failure; returns the number of fetch cycles.
    pub(crate) async fn run(self, token: CancellationToken) -> Result<u64, LoopCrash> {
        let mut cycle: u64 = 0;
        let mut streak: u32 = 0;

        loop {
            if token.is_cancelled() {
                break;
            }
            cycle += 1;

            match self.source.fetch_one(token.clone()).await {
                Ok(reading) => {
                    streak = 0;
                    self.publish(cycle, reading);
                }
                Err(FetchError::Canceled) => {
                    log::debug!(target: "feedvisor", "[{}] fetch observed cancellation", self.name);
                    break;
                }
                Err(err) if err.is_transient() => {
                    streak = streak.saturating_add(1);
                    self.report_skipped(cycle, &err);

                    if !self.pause(cycle, streak, &token).await {
                        break;
                    }
                }
                Err(error) => {
                    return Err(LoopCrash {
                        cycle: Some(cycle),
                        error,
                    });
                }
            }
        }

        log::info!(target: "feedvisor", "[{}] acquisition loop exited after {cycle} cycles", self.name);
        self.bus.publish(
            Event::new(EventKind::LoopExited)
                .with_source(Arc::clone(&self.name))
                .with_cycle(cycle),
        );
        Ok(cycle)
    }

    fn publish(&self, cycle: u64, reading: Reading<S::Payload>) {
        self.store.publish(reading);
        let fan_out = self.store.notify_all();

        for (id, info) in fan_out.failed {
            self.bus.publish(
                Event::new(EventKind::SubscriberPanicked)
                    .with_source(Arc::clone(&self.name))
                    .with_cycle(cycle)
                    .with_reason(format!("{id}: {info}")),
            );
        }
        log::debug!(
            target: "feedvisor",
            "[{}] cycle {cycle}: reading published to {} subscribers",
            self.name,
            fan_out.delivered
        );
        self.bus.publish(
            Event::new(EventKind::ReadingPublished)
                .with_source(Arc::clone(&self.name))
                .with_cycle(cycle),
        );
    }

    fn report_skipped(&self, cycle: u64, err: &FetchError) {
        let ev = match err {
            FetchError::NoData { reason } => {
                log::warn!(target: "feedvisor", "[{}] cycle {cycle}: no data received: {reason}", self.name);
                Event::new(EventKind::NoDataAvailable).with_reason(reason.as_str())
            }
            FetchError::Malformed { raw, reason } => {
                log::warn!(
                    target: "feedvisor",
                    "[{}] cycle {cycle}: faulty data received ({reason}): {raw:?}",
                    self.name
                );
                Event::new(EventKind::MalformedData)
                    .with_reason(reason.as_str())
                    .with_payload(raw.as_str())
            }
            _ => return,
        };
        self.bus
            .publish(ev.with_source(Arc::clone(&self.name)).with_cycle(cycle));
    }

    /// Sleeps per the safety backoff, if any. Returns `false` when cancelled meanwhile.
    async fn pause(&self, cycle: u64, streak: u32, token: &CancellationToken) -> bool {
        let Some(backoff) = &self.backoff else {
            return true;
        };
        let delay = backoff.delay_for(streak);
        if delay.is_zero() {
            return true;
        }

        self.bus.publish(
            Event::new(EventKind::BackoffScheduled)
                .with_source(Arc::clone(&self.name))
                .with_cycle(cycle)
                .with_delay(delay),
        );
        let sleep = time::sleep(delay);
        tokio::pin!(sleep);
        select! {
            _ = &mut sleep => true,
            _ = token.cancelled() => false,
        }
    }
}
