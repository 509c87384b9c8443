//! # Observers: diagnostic consumers of lifecycle events.
//!
//! An [`Observe`] implementation receives the [`Event`](crate::Event)s the
//! supervisor publishes (startup, skipped cycles with raw payloads, shutdown,
//! subscriber panics). Use it for metrics, alerting or custom logging.
//! Failures of the observers themselves are only visible on the bus.
//!
//! Observers are **not** store subscribers: they never see readings and never
//! delay the acquisition loop. Each one is driven by its own worker fed by a
//! bounded queue owned by [`ObserverSet`].
//!
//! ```text
//! Supervisor / loop ── publish ──► Bus ──► listener ──► ObserverSet::emit
//!                                                     ┌──────┼──────┐
//!                                                     ▼      ▼      ▼
//!                                                  [q1]   [q2]   [qN]
//!                                                     ▼      ▼      ▼
//!                                                 on_event on_event on_event
//! ```

mod observe;
mod set;

pub use observe::Observe;
pub use set::ObserverSet;
pub(crate) use set::panic_message;
