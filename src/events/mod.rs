//! Lifecycle events: types and broadcast bus.
//!
//! The supervisor and its acquisition loop describe what they do as [`Event`]s
//! published on a [`Bus`]. Observers (see [`crate::observers`]) and anything holding
//! a receiver from [`Supervisor::events`](crate::Supervisor::events) can follow them.
//!
//! Events are diagnostics. Readings themselves travel through the
//! [`SharedStore`](crate::SharedStore), never through the bus.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
