//! # feedvisor
//!
//! **Feedvisor** supervises a long-running acquisition loop: it fetches readings
//! from a device (or a synthetic generator) through a pluggable [`DataSource`],
//! publishes the latest one into a [`SharedStore`], and notifies the store's
//! subscribers.
//!
//! ## Architecture
//! ```text
//!   ┌──────────────────┐
//!   │    DataSource    │  before_start / fetch_one(token) / after_stop
//!   │ (serial, mock..) │
//!   └────────┬─────────┘
//!            ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                  │
//! │  - lifecycle: Stopped → Starting → Running → Stopping        │
//! │  - acquisition loop on its own task (CancellationToken)      │
//! │  - bounded shutdown (grace period, then cleanup regardless)  │
//! └───────┬─────────────────────────────────────────┬────────────┘
//!         │ publish + notify_all (per success)      │ Events
//!         ▼                                         ▼
//! ┌──────────────────────┐                 ┌──────────────────┐
//! │     SharedStore      │                 │  Bus (broadcast) │
//! │ current(): latest    │                 └────────┬─────────┘
//! │ subscribers: [cb..]  │                          ▼
//! └───┬──────────────┬───┘                    ObserverSet
//!     ▼              ▼                     (per-observer queues)
//!  web handler   HistoryRecorder
//! ```
//!
//! ### Fetch cycle
//! ```text
//! fetch_one ─┬─ Ok(reading)  ─► publish ─► notify_all
//!            ├─ NoData       ─► log, skip      (transient)
//!            ├─ Malformed    ─► log raw, skip  (transient)
//!            ├─ Canceled     ─► loop exits
//!            └─ other error  ─► loop crashes, surfaced by stop()
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types                                   |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Supervision**   | Start/stop the acquisition loop with hooks and grace period. | [`Supervisor`], [`SupervisorState`]         |
//! | **Sources**       | Pluggable "fetch one reading" strategy.                      | [`DataSource`], [`SourceFn`]                |
//! | **State**         | Latest reading + notification subscribers.                   | [`SharedStore`], [`Reading`]                |
//! | **History**       | Interval-sampled in-memory history.                          | [`HistoryRecorder`]                         |
//! | **Diagnostics**   | Lifecycle events and observers.                              | [`Event`], [`Observe`], [`ObserverSet`]     |
//! | **Errors**        | Typed fetch/setup/runtime errors.                            | [`FetchError`], [`SetupError`], [`RuntimeError`] |
//! | **Configuration** | Grace period, bus capacity, optional error backoff.          | [`Config`], [`BackoffPolicy`]               |
//!
//! Logging goes through the [`log`] facade (target `feedvisor`); install any
//! logger in the host application.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use feedvisor::{Config, FetchError, Reading, SourceFn, Supervisor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = SourceFn::arc("synthetic", |ctx: CancellationToken| async move {
//!         tokio::select! {
//!             _ = ctx.cancelled() => Err(FetchError::Canceled),
//!             _ = tokio::time::sleep(Duration::from_millis(10)) => Ok(Reading::now(21.5_f32)),
//!         }
//!     });
//!
//!     let sup = Supervisor::builder(source)
//!         .with_config(Config::default().with_grace(Duration::from_secs(1)))
//!         .build();
//!
//!     sup.store().subscribe(|| println!("new reading"));
//!     sup.start().await?;
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//!     sup.stop().await?;
//!
//!     assert!(sup.store().current().is_some());
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod history;
mod observers;
mod policies;
mod reading;
mod source;
mod store;

// ---- Public re-exports ----

pub use crate::core::{Config, Supervisor, SupervisorBuilder, SupervisorState};
pub use error::{FetchError, RuntimeError, SetupError};
pub use events::{Bus, Event, EventKind};
pub use history::{HistoryConfig, HistoryRecorder};
pub use observers::{Observe, ObserverSet};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use reading::Reading;
pub use source::{DataSource, SourceFn};
pub use store::{FanOut, SharedStore, SubscriptionId};
